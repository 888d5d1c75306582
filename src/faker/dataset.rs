//! Real-world log lines embedded in the binary, sampled by the `logs` kind.

use once_cell::sync::Lazy;
use rand::Rng;
use serde::Deserialize;

use super::{parse_options, FakeError, FakeKind, Options};
use crate::distribution::{parse_record_size, Distribution};

/// A set of sample log lines and their average length in bytes.
#[derive(Debug)]
pub struct Dataset {
    pub lines: Vec<&'static str>,
    pub average_size: usize,
}

impl Dataset {
    fn from_raw(raw: &'static str) -> Self {
        let lines: Vec<&'static str> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let total: usize = lines.iter().map(|l| l.len()).sum();
        let average_size = (total / lines.len().max(1)).max(1);

        Self {
            lines,
            average_size,
        }
    }
}

static APACHE: Lazy<Dataset> = Lazy::new(|| Dataset::from_raw(include_str!("data/Apache_2k.log")));

static ZOOKEEPER: Lazy<Dataset> =
    Lazy::new(|| Dataset::from_raw(include_str!("data/Zookeeper_2k.log")));

/// The embedded datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DatasetName {
    #[serde(rename = "Apache_2k")]
    Apache2k,
    #[serde(rename = "Zookeeper_2k")]
    Zookeeper2k,
}

impl DatasetName {
    pub fn dataset(&self) -> &'static Dataset {
        match self {
            DatasetName::Apache2k => &APACHE,
            DatasetName::Zookeeper2k => &ZOOKEEPER,
        }
    }
}

/// Options for the `logs` kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LogsOptions {
    pub dataset: Option<DatasetName>,

    /// Approximate total size, e.g. `"4kib"`
    pub size: Option<String>,

    /// Weighted size ranges, e.g. `["10%:1kib-2kib", "90%:100bytes-1kib"]`
    pub size_range_with_possibility: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
enum Target {
    Fixed(i64),
    Distributed(Distribution),
}

/// Compiled `logs` provider.
#[derive(Debug, Clone)]
pub struct LogsProvider {
    dataset: DatasetName,
    target: Target,
}

impl LogsProvider {
    pub fn new(options: &Options) -> Result<Self, FakeError> {
        let kind = FakeKind::Logs;
        let opts: LogsOptions = parse_options(kind, options)?;

        let dataset = opts
            .dataset
            .ok_or_else(|| FakeError::invalid(kind, "dataset is required"))?;

        let target = match (opts.size, opts.size_range_with_possibility) {
            (Some(size), None) => {
                let bytes =
                    parse_record_size(&size).map_err(|message| FakeError::invalid(kind, message))?;
                Target::Fixed(bytes)
            }
            (None, Some(specs)) => Target::Distributed(
                Distribution::parse(specs.as_slice())
                    .map_err(|source| FakeError::Distribution { kind, source })?,
            ),
            (Some(_), Some(_)) => {
                return Err(FakeError::invalid(
                    kind,
                    "size and sizeRangeWithPossibility are exclusive",
                ))
            }
            (None, None) => {
                return Err(FakeError::invalid(
                    kind,
                    "one of size or sizeRangeWithPossibility is required",
                ))
            }
        };

        Ok(Self { dataset, target })
    }

    /// Join randomly chosen dataset lines with `\n`.
    ///
    /// The line count is the target size divided by the dataset's average
    /// line size, so a target below one average line yields an empty string.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let size = match &self.target {
            Target::Fixed(size) => *size,
            Target::Distributed(dist) => dist.sample(rng),
        };

        let dataset = self.dataset.dataset();
        let count = (size.max(0) as usize) / dataset.average_size;

        (0..count)
            .map(|_| dataset.lines[rng.gen_range(0..dataset.lines.len())])
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    fn provider(value: Value) -> Result<LogsProvider, FakeError> {
        match value {
            Value::Object(map) => LogsProvider::new(&map),
            _ => panic!("options must be an object"),
        }
    }

    #[test]
    fn test_datasets_load() {
        for name in [DatasetName::Apache2k, DatasetName::Zookeeper2k] {
            let dataset = name.dataset();
            assert!(!dataset.lines.is_empty());
            assert!(dataset.average_size > 0);
        }
    }

    #[test]
    fn test_line_count_follows_size() {
        let average = DatasetName::Zookeeper2k.dataset().average_size;
        let size = format!("{}bytes", average * 5);
        let p = provider(json!({"dataset": "Zookeeper_2k", "size": size})).unwrap();

        let out = p.generate(&mut StdRng::seed_from_u64(1));
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn test_size_below_average_is_empty() {
        let p = provider(json!({"dataset": "Apache_2k", "size": "1bytes"})).unwrap();
        assert_eq!(p.generate(&mut StdRng::seed_from_u64(1)), "");
    }

    #[test]
    fn test_distributed_size() {
        let p = provider(json!({
            "dataset": "Apache_2k",
            "sizeRangeWithPossibility": ["100%:1kib-2kib"]
        }))
        .unwrap();

        let out = p.generate(&mut StdRng::seed_from_u64(1));
        assert!(!out.is_empty());
    }

    #[test]
    fn test_oversized_record_rejected() {
        assert!(provider(json!({"dataset": "Apache_2k", "size": "1pib"})).is_err());
        assert!(provider(json!({"dataset": "Apache_2k", "size": "65mib"})).is_err());
    }

    #[test]
    fn test_invalid_options() {
        assert!(provider(json!({"size": "1kib"})).is_err());
        assert!(provider(json!({"dataset": "Hadoop_2k", "size": "1kib"})).is_err());
        assert!(provider(json!({"dataset": "Apache_2k"})).is_err());
        assert!(provider(json!({"dataset": "Apache_2k", "size": "lots"})).is_err());

        let err = provider(json!({
            "dataset": "Apache_2k",
            "sizeRangeWithPossibility": ["60%:1kib-2kib"]
        }))
        .unwrap_err();
        assert!(matches!(err, FakeError::Distribution { .. }));
    }
}
