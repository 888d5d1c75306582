//! Parsing of human-readable sizes and percentages.
//!
//! Sizes are written as an integer followed by a unit, for example `100bytes`,
//! `4KiB` or `2mb`. Units are matched case-insensitively; the `*ib` units use a
//! 1024 scale and the `*b` units a 1000 scale.

/// Error returned when a size or percentage string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeError {
    pub input: String,
    pub message: String,
}

impl SizeError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for SizeError {}

/// Multiplier for a lower-cased unit name.
fn unit_multiplier(unit: &str) -> Option<i64> {
    let multiplier = match unit {
        "bytes" => 1,

        "kib" => 1 << 10,
        "mib" => 1 << 20,
        "gib" => 1 << 30,
        "tib" => 1 << 40,
        "pib" => 1 << 50,

        "kb" => 1_000,
        "mb" => 1_000_000,
        "gb" => 1_000_000_000,
        "tb" => 1_000_000_000_000,
        "pb" => 1_000_000_000_000_000,

        _ => return None,
    };
    Some(multiplier)
}

/// Parse a size string such as `"100bytes"` or `"1KiB"` into a number of bytes.
///
/// # Errors
///
/// Returns `SizeError` if the string is empty, has no leading digits, has no
/// unit, uses an unknown unit, or overflows an `i64`.
pub fn parse_size(input: &str) -> Result<i64, SizeError> {
    let normalized = input.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(SizeError::new(input, "size is empty"));
    }

    let unit_start = normalized
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| SizeError::new(input, "missing size unit"))?;

    let (number, unit) = normalized.split_at(unit_start);
    if number.is_empty() {
        return Err(SizeError::new(input, "missing size number"));
    }

    let number: i64 = number
        .parse()
        .map_err(|_| SizeError::new(input, "size number is out of range"))?;

    let multiplier = unit_multiplier(unit.trim())
        .ok_or_else(|| SizeError::new(input, format!("unknown size unit '{}'", unit.trim())))?;

    number
        .checked_mul(multiplier)
        .ok_or_else(|| SizeError::new(input, "size overflows 64 bits"))
}

/// Parse a percentage such as `"25%"` into a fraction (`0.25`).
pub fn parse_percentage(input: &str) -> Result<f64, SizeError> {
    let trimmed = input.trim();
    let number = trimmed
        .strip_suffix('%')
        .ok_or_else(|| SizeError::new(input, "percentage must end with '%'"))?;

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SizeError::new(input, "percentage is not a number"))?;

    Ok(value / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("100bytes").unwrap(), 100);
        assert_eq!(parse_size("1kib").unwrap(), 1024);
        assert_eq!(parse_size("5kb").unwrap(), 5_000);
        assert_eq!(parse_size("2mib").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("9mb").unwrap(), 9_000_000);
        assert_eq!(parse_size("3gib").unwrap(), 3 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("3gb").unwrap(), 3_000_000_000);
        assert_eq!(parse_size("4TiB").unwrap(), 4 * (1i64 << 40));
        assert_eq!(parse_size("4TB").unwrap(), 4_000_000_000_000);
        assert_eq!(parse_size("5PiB").unwrap(), 5 * (1i64 << 50));
        assert_eq!(parse_size("5PB").unwrap(), 5_000_000_000_000_000);
    }

    #[test]
    fn test_parse_size_is_case_insensitive_and_trims() {
        assert_eq!(parse_size("  10KIB ").unwrap(), 10 * 1024);
        assert_eq!(parse_size("10 kib").unwrap(), 10 * 1024);
    }

    #[test]
    fn test_parse_size_rejects_bad_input() {
        assert!(parse_size("").is_err());
        assert!(parse_size("100").is_err());
        assert!(parse_size("kib").is_err());
        assert!(parse_size("10furlongs").is_err());
        assert!(parse_size("1.5kib").is_err());

        let err = parse_size("9999999PB").unwrap_err();
        assert!(err.message.contains("overflows"));
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("100%").unwrap(), 1.0);
        assert_eq!(parse_percentage("25%").unwrap(), 0.25);
        assert!((parse_percentage("33.3%").unwrap() - 0.333).abs() < 1e-9);
        assert_eq!(parse_percentage(" 0% ").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_percentage_rejects_bad_input() {
        assert!(parse_percentage("").is_err());
        assert!(parse_percentage("25").is_err());
        assert!(parse_percentage("abc%").is_err());
    }
}
