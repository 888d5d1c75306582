//! Bounded number provider.

use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_options, FakeError, FakeKind, Options};

/// A bound written either as a number or as a numeric string (`min: "100"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Number(serde_json::Number),
    Text(String),
}

impl Bound {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Bound::Number(n) => n.as_i64(),
            Bound::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Bound::Number(n) => n.as_f64(),
            Bound::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Options for the `number` kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumberOptions {
    /// Inclusive lower bound (default 0)
    pub min: Option<Bound>,

    /// Inclusive upper bound (default `i32::MAX`)
    pub max: Option<Bound>,

    /// Generate a float in `[min, max)` instead of an integer
    pub float: bool,

    /// Digits after the decimal point, floats only
    pub precision: Option<usize>,

    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Range {
    Int(i64, i64),
    Float(f64, f64),
}

/// Compiled `number` provider.
#[derive(Debug, Clone)]
pub struct NumberProvider {
    range: Range,
    precision: Option<usize>,
    prefix: String,
    suffix: String,
}

impl NumberProvider {
    pub fn new(options: &Options) -> Result<Self, FakeError> {
        let kind = FakeKind::Number;
        let opts: NumberOptions = parse_options(kind, options)?;

        if opts.precision.is_some() && !opts.float {
            return Err(FakeError::invalid(kind, "precision is only used for float numbers"));
        }

        let range = if opts.float {
            let min = bound(kind, opts.min.as_ref(), "min", Bound::as_f64, 0.0)?;
            let max = bound(kind, opts.max.as_ref(), "max", Bound::as_f64, f64::from(i32::MAX))?;
            if !min.is_finite() || !max.is_finite() {
                return Err(FakeError::invalid(
                    kind,
                    format!("bounds must be finite, got min '{}' and max '{}'", min, max),
                ));
            }
            if min >= max {
                return Err(FakeError::invalid(
                    kind,
                    format!("min value '{}' must be less than max value '{}'", min, max),
                ));
            }
            if !(max - min).is_finite() {
                return Err(FakeError::invalid(
                    kind,
                    format!("range from '{}' to '{}' is too wide", min, max),
                ));
            }
            Range::Float(min, max)
        } else {
            let min = bound(kind, opts.min.as_ref(), "min", Bound::as_i64, 0)?;
            let max = bound(kind, opts.max.as_ref(), "max", Bound::as_i64, i64::from(i32::MAX))?;
            if min > max {
                return Err(FakeError::invalid(
                    kind,
                    format!("min value '{}' is greater than the max value '{}'", min, max),
                ));
            }
            Range::Int(min, max)
        };

        Ok(Self {
            range,
            precision: opts.precision,
            prefix: opts.prefix.unwrap_or_default(),
            suffix: opts.suffix.unwrap_or_default(),
        })
    }

    /// Numbers are emitted as JSON numbers unless a prefix or suffix turns
    /// them into text.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let value = match self.range {
            Range::Int(min, max) => Value::from(rng.gen_range(min..=max)),
            Range::Float(min, max) => {
                let n = rng.gen_range(min..max);
                match self.precision {
                    Some(precision) => Value::String(format!("{:.*}", precision, n)),
                    None => Value::from(n),
                }
            }
        };

        if self.prefix.is_empty() && self.suffix.is_empty() {
            return value;
        }

        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Value::String(format!("{}{}{}", self.prefix, text, self.suffix))
    }
}

fn bound<T>(
    kind: FakeKind,
    value: Option<&Bound>,
    name: &str,
    convert: fn(&Bound) -> Option<T>,
    default: T,
) -> Result<T, FakeError> {
    match value {
        None => Ok(default),
        Some(b) => convert(b)
            .ok_or_else(|| FakeError::invalid(kind, format!("{} is not a valid number", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn provider(value: Value) -> Result<NumberProvider, FakeError> {
        match value {
            Value::Object(map) => NumberProvider::new(&map),
            _ => panic!("options must be an object"),
        }
    }

    #[test]
    fn test_string_bounds_are_inclusive() {
        let p = provider(json!({"min": "1", "max": "3"})).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let mut seen = [false; 3];
        for _ in 0..200 {
            let n = p.generate(&mut rng).as_i64().unwrap();
            assert!((1..=3).contains(&n));
            seen[(n - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_numeric_bounds() {
        let p = provider(json!({"min": 100, "max": 100})).unwrap();
        assert_eq!(p.generate(&mut StdRng::seed_from_u64(1)), json!(100));
    }

    #[test]
    fn test_float_with_precision() {
        let p = provider(json!({"min": 1, "max": 2, "float": true, "precision": 2})).unwrap();
        let value = p.generate(&mut StdRng::seed_from_u64(1));
        let text = value.as_str().unwrap();
        assert_eq!(text.len(), 4);
        assert!(text.starts_with("1."));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let p = provider(json!({"min": 7, "max": 7, "prefix": "ID", "suffix": "ms"})).unwrap();
        assert_eq!(p.generate(&mut StdRng::seed_from_u64(1)), json!("ID7ms"));
    }

    #[test]
    fn test_invalid_options() {
        assert!(provider(json!({"min": "10", "max": "1"})).is_err());
        assert!(provider(json!({"min": "ten"})).is_err());
        assert!(provider(json!({"precision": 2})).is_err());
        assert!(provider(json!({"float": true, "min": 2, "max": 2})).is_err());
        assert!(provider(json!({"unknown": true})).is_err());
    }

    #[test]
    fn test_non_finite_float_bounds() {
        assert!(provider(json!({"float": true, "min": "-inf"})).is_err());
        assert!(provider(json!({"float": true, "max": "inf"})).is_err());
        assert!(provider(json!({"float": true, "min": "NaN", "max": 1})).is_err());
        assert!(provider(json!({"float": true, "min": -1.0e308, "max": 1.0e308})).is_err());

        assert!(provider(json!({"float": true, "min": "-1.5", "max": "1e6"})).is_ok());
    }
}
