//! Weighted size distribution built from `"<pct>%:<min>-<max>"` specs.
//!
//! A distribution is parsed and validated once, then sampled many times. Each
//! sample first picks a range with probability proportional to its declared
//! weight and then draws a size uniformly from `[min, max)` inside that range.

use rand::Rng;

use crate::units::{parse_percentage, parse_size};

/// Maximum allowed deviation of the summed probabilities from 1.0.
const PROBABILITY_EPSILON: f64 = 1e-6;

/// Largest size, in bytes, a single generated record may ask for.
pub const MAX_RECORD_SIZE: i64 = 64 * 1024 * 1024;

/// A single weighted size range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: i64,
    pub max: i64,
    pub probability: f64,
}

impl std::fmt::Display for SizeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}%:[{}, {})",
            self.probability * 100.0,
            self.min,
            self.max
        )
    }
}

/// Errors raised while building a [`Distribution`].
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The entry does not follow the `pct%:min-max` grammar
    MalformedSpec { spec: String, reason: String },

    /// Two ranges share at least one value
    OverlappingRanges { first: SizeRange, second: SizeRange },

    /// A range has `min >= max`
    InvertedRange(SizeRange),

    /// A probability lies outside `[0, 1]`
    ProbabilityOutOfBounds(SizeRange),

    /// Probabilities do not add up to 1.0
    ProbabilityMismatch { sum: f64 },
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::MalformedSpec { spec, reason } => {
                write!(f, "malformed size range spec '{}': {}", spec, reason)
            }
            DistributionError::OverlappingRanges { first, second } => write!(
                f,
                "the range [{}, {}) overlaps with the range [{}, {})",
                first.min, first.max, second.min, second.max
            ),
            DistributionError::InvertedRange(range) => {
                write!(f, "range {} must have min < max", range)
            }
            DistributionError::ProbabilityOutOfBounds(range) => {
                write!(f, "range {} has a probability outside [0%, 100%]", range)
            }
            DistributionError::ProbabilityMismatch { sum } => write!(
                f,
                "probabilities sum to {}%, expected 100%",
                sum * 100.0
            ),
        }
    }
}

impl std::error::Error for DistributionError {}

/// A validated, immutable set of weighted size ranges.
///
/// Ranges are kept sorted by ascending `min` and their cumulative probability
/// is precomputed, so sampling only needs a linear scan.
#[derive(Debug, Clone)]
pub struct Distribution {
    ranges: Vec<SizeRange>,
    cumulative: Vec<f64>,
    fallback: usize,
}

impl Distribution {
    /// Parse and validate a list of `"<pct>%:<min>-<max>"` specs.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSpec` for grammar errors, and `InvertedRange`,
    /// `ProbabilityOutOfBounds`, `OverlappingRanges` or `ProbabilityMismatch`
    /// when the parsed ranges do not form a valid distribution.
    ///
    /// # Examples
    ///
    /// ```
    /// use o11ybench::distribution::Distribution;
    ///
    /// let dist = Distribution::parse(&["80%:10bytes-100bytes", "20%:1kib-2kib"]).unwrap();
    /// assert_eq!(dist.ranges().len(), 2);
    /// ```
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, DistributionError> {
        if specs.is_empty() {
            return Err(DistributionError::MalformedSpec {
                spec: String::new(),
                reason: "no size ranges given".to_string(),
            });
        }

        let ranges = specs
            .iter()
            .map(|spec| parse_range_spec(spec.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_ranges(ranges)
    }

    /// Build a distribution from already-parsed ranges.
    pub fn from_ranges(mut ranges: Vec<SizeRange>) -> Result<Self, DistributionError> {
        validate(&ranges)?;

        ranges.sort_by_key(|r| r.min);

        let cumulative = ranges
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r.probability;
                Some(*acc)
            })
            .collect();

        // Last range that can actually be drawn.
        let fallback = ranges
            .iter()
            .rposition(|r| r.probability > 0.0)
            .unwrap_or(ranges.len() - 1);

        Ok(Self {
            ranges,
            cumulative,
            fallback,
        })
    }

    /// Draw one size from the distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let u: f64 = rng.gen();
        let range = self.range_for(u);
        rng.gen_range(range.min..range.max)
    }

    /// The range a uniform draw `u` in `[0, 1)` falls into.
    ///
    /// Rounding can leave the final cumulative value a hair below 1.0. Such a
    /// draw goes to the last range with a non-zero probability.
    fn range_for(&self, u: f64) -> &SizeRange {
        let index = self
            .cumulative
            .iter()
            .zip(&self.ranges)
            .position(|(&c, r)| u < c && r.probability > 0.0)
            .unwrap_or(self.fallback);

        &self.ranges[index]
    }

    /// The ranges in ascending `min` order.
    pub fn ranges(&self) -> &[SizeRange] {
        &self.ranges
    }
}

fn parse_range_spec(spec: &str) -> Result<SizeRange, DistributionError> {
    let malformed = |reason: String| DistributionError::MalformedSpec {
        spec: spec.to_string(),
        reason,
    };

    let (probability, range) = spec
        .split_once(':')
        .ok_or_else(|| malformed("expected '<pct>%:<min>-<max>'".to_string()))?;

    if range.contains(':') {
        return Err(malformed("more than one ':' separator".to_string()));
    }

    let probability = parse_percentage(probability).map_err(|e| malformed(e.to_string()))?;
    let (min, max) = parse_size_range(range).map_err(malformed)?;

    Ok(SizeRange {
        min,
        max,
        probability,
    })
}

/// Parse `"<min>-<max>"` into a pair of byte counts.
pub fn parse_size_range(input: &str) -> Result<(i64, i64), String> {
    let (min, max) = input
        .split_once('-')
        .ok_or_else(|| format!("expected '<min>-<max>' in '{}'", input.trim()))?;

    if max.contains('-') {
        return Err(format!("more than one '-' separator in '{}'", input.trim()));
    }

    let min = parse_record_size(min)?;
    let max = parse_record_size(max)?;

    Ok((min, max))
}

/// Parse a record size and check it against [`MAX_RECORD_SIZE`].
pub fn parse_record_size(input: &str) -> Result<i64, String> {
    let size = parse_size(input).map_err(|e| e.to_string())?;
    if size > MAX_RECORD_SIZE {
        return Err(format!(
            "size '{}' exceeds the {} byte record limit",
            input.trim(),
            MAX_RECORD_SIZE
        ));
    }
    Ok(size)
}

fn validate(ranges: &[SizeRange]) -> Result<(), DistributionError> {
    let mut sum = 0.0;

    for (i, range) in ranges.iter().enumerate() {
        if range.min >= range.max {
            return Err(DistributionError::InvertedRange(*range));
        }

        if !(0.0..=1.0).contains(&range.probability) {
            return Err(DistributionError::ProbabilityOutOfBounds(*range));
        }

        for other in &ranges[i + 1..] {
            if range.max > other.min && range.min < other.max {
                return Err(DistributionError::OverlappingRanges {
                    first: *range,
                    second: *other,
                });
            }
        }

        sum += range.probability;
    }

    if (sum - 1.0).abs() > PROBABILITY_EPSILON {
        return Err(DistributionError::ProbabilityMismatch { sum });
    }

    Ok(())
}
