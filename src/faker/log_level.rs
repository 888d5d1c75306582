//! Log severity levels in the vocabularies of common log producers.

use rand::Rng;
use serde::Deserialize;

use super::{parse_options, FakeError, FakeKind, Options};

/// Which producer's level vocabulary to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFamily {
    #[default]
    General,
    Syslog,
    Apache,
}

impl LevelFamily {
    /// Get all level names of this family.
    pub fn levels(&self) -> &'static [&'static str] {
        match self {
            LevelFamily::General => &["error", "warning", "info", "fatal", "trace", "debug"],
            LevelFamily::Syslog => &[
                "emerg", "alert", "crit", "err", "warning", "notice", "info", "debug",
            ],
            LevelFamily::Apache => &[
                "emerg", "alert", "crit", "error", "warn", "notice", "info", "debug", "trace1",
                "trace2", "trace3", "trace4", "trace5", "trace6", "trace7", "trace8",
            ],
        }
    }
}

impl std::fmt::Display for LevelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelFamily::General => write!(f, "general"),
            LevelFamily::Syslog => write!(f, "syslog"),
            LevelFamily::Apache => write!(f, "apache"),
        }
    }
}

/// Options for the `logLevel` kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogLevelOptions {
    /// Level vocabulary; takes precedence over `levels`
    #[serde(rename = "type")]
    pub family: Option<LevelFamily>,

    /// Explicit set of levels to choose from
    pub levels: Vec<String>,

    pub uppercase: bool,
}

#[derive(Debug, Clone)]
enum Choices {
    Family(LevelFamily),
    Custom(Vec<String>),
}

/// Compiled `logLevel` provider.
#[derive(Debug, Clone)]
pub struct LogLevelProvider {
    choices: Choices,
    uppercase: bool,
}

impl LogLevelProvider {
    pub fn new(options: &Options) -> Result<Self, FakeError> {
        let opts: LogLevelOptions = parse_options(FakeKind::LogLevel, options)?;

        let choices = match opts.family {
            Some(family) => Choices::Family(family),
            None if !opts.levels.is_empty() => Choices::Custom(opts.levels),
            None => Choices::Family(LevelFamily::default()),
        };

        Ok(Self {
            choices,
            uppercase: opts.uppercase,
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let level = match &self.choices {
            Choices::Family(family) => {
                let levels = family.levels();
                levels[rng.gen_range(0..levels.len())].to_string()
            }
            Choices::Custom(levels) => levels[rng.gen_range(0..levels.len())].clone(),
        };

        if self.uppercase {
            level.to_uppercase()
        } else {
            level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    fn provider(value: Value) -> Result<LogLevelProvider, FakeError> {
        match value {
            Value::Object(map) => LogLevelProvider::new(&map),
            _ => panic!("options must be an object"),
        }
    }

    #[test]
    fn test_family_levels() {
        let p = provider(json!({"type": "syslog"})).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let level = p.generate(&mut rng);
            assert!(LevelFamily::Syslog.levels().contains(&level.as_str()));
        }
    }

    #[test]
    fn test_explicit_levels_uppercased() {
        let p = provider(json!({"levels": ["info", "warn"], "uppercase": true})).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let level = p.generate(&mut rng);
            assert!(level == "INFO" || level == "WARN", "{}", level);
        }
    }

    #[test]
    fn test_default_is_general() {
        let p = LogLevelProvider::new(&Options::new()).unwrap();
        let level = p.generate(&mut StdRng::seed_from_u64(2));
        assert!(LevelFamily::General.levels().contains(&level.as_str()));
    }

    #[test]
    fn test_unknown_family_rejected() {
        let err = provider(json!({"type": "windows"})).unwrap_err();
        assert!(err.to_string().starts_with("invalid options for 'logLevel'"));
    }
}
