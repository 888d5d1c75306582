//! Time-windowed log generation.
//!
//! A [`TimeWindow`] is a validated `(start, end]` span cut into whole
//! intervals. Tick `k` (1-based) happens at `start + k * interval`, so a
//! window of `n` intervals produces exactly `n` ticks. Each tick draws its
//! values from a random source seeded by the generator seed and the tick
//! index, which makes the output independent of how the window is split
//! across threads.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};

use crate::formats::TIMESTAMP;
use crate::renderer::{RenderError, Renderer};
use crate::timestamp::TimestampFormat;

/// Number of ticks generated when neither an end nor a count is given.
pub const DEFAULT_COUNT: u64 = 100;

/// Errors raised while generating records.
#[derive(Debug)]
pub enum GeneratorError {
    /// The time window is empty, inverted or out of range
    InvalidTimeWindow(String),

    /// A record could not be rendered
    Render(RenderError),

    /// Every chunk of a parallel run failed
    ChunksFailed { chunks: usize },
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::InvalidTimeWindow(msg) => write!(f, "invalid time window: {}", msg),
            GeneratorError::Render(e) => write!(f, "{}", e),
            GeneratorError::ChunksFailed { chunks } => {
                write!(f, "all {} generation chunks failed", chunks)
            }
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for GeneratorError {
    fn from(err: RenderError) -> Self {
        GeneratorError::Render(err)
    }
}

/// `start + k * interval`, or `None` on overflow.
fn offset(start: DateTime<Utc>, interval: Duration, k: u64) -> Option<DateTime<Utc>> {
    let nanos = interval.as_nanos().checked_mul(u128::from(k))?;
    let nanos = i64::try_from(nanos).ok()?;
    start.checked_add_signed(chrono::Duration::nanoseconds(nanos))
}

/// A validated span of whole intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: Duration,
    ticks: u64,
}

impl TimeWindow {
    /// Build a window from explicit bounds.
    ///
    /// An `end` that is not a whole number of intervals after `start` is
    /// snapped down to the last whole interval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimeWindow` if `interval` is zero, `start > end`, or
    /// the window is shorter than one interval.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Duration,
    ) -> Result<Self, GeneratorError> {
        let invalid = |msg: String| GeneratorError::InvalidTimeWindow(msg);

        if interval.is_zero() {
            return Err(invalid("interval must be positive".to_string()));
        }

        if start > end {
            return Err(invalid(format!("start {} is after end {}", start, end)));
        }

        let span = (end - start)
            .num_nanoseconds()
            .ok_or_else(|| invalid("time range is too long".to_string()))?;
        let step = i64::try_from(interval.as_nanos())
            .map_err(|_| invalid("interval is too long".to_string()))?;

        let ticks = (span / step) as u64;
        if ticks == 0 {
            return Err(invalid(format!(
                "start {} plus interval {:?} is after end {}",
                start, interval, end
            )));
        }

        let end = offset(start, interval, ticks)
            .ok_or_else(|| invalid("time range is too long".to_string()))?;

        Ok(Self {
            start,
            end,
            interval,
            ticks,
        })
    }

    /// Build a window from a start, an optional end and an optional count.
    ///
    /// Without an end, the window spans `count` intervals (default
    /// [`DEFAULT_COUNT`]). With both, the count shrinks the end when it
    /// implies a shorter span; otherwise the full span is used.
    pub fn resolve(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        interval: Duration,
        count: Option<u64>,
    ) -> Result<Self, GeneratorError> {
        let count = count.filter(|c| *c > 0);
        let too_long = || GeneratorError::InvalidTimeWindow("time range is too long".to_string());

        let end = match end {
            None => offset(start, interval, count.unwrap_or(DEFAULT_COUNT)).ok_or_else(too_long)?,
            Some(end) => match count.and_then(|c| offset(start, interval, c)) {
                Some(expected) if expected < end => expected,
                _ => end,
            },
        };

        Self::new(start, end, interval)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The instant of the last tick.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// The instant of tick `k`, 1-based.
    pub fn tick(&self, k: u64) -> DateTime<Utc> {
        // k never exceeds the validated tick count, whose offset exists.
        offset(self.start, self.interval, k).unwrap_or(self.end)
    }

    /// Split the window into at most `parallelism` contiguous chunks.
    ///
    /// Every chunk gets `ticks / parts` ticks; the last one also takes the
    /// remainder.
    pub fn chunks(&self, parallelism: usize) -> Vec<Chunk> {
        let parts = (parallelism.max(1) as u64).min(self.ticks);
        let per_chunk = self.ticks / parts;

        (0..parts)
            .map(|i| {
                let before = i * per_chunk;
                let ticks = if i == parts - 1 {
                    self.ticks - before
                } else {
                    per_chunk
                };

                Chunk {
                    index: i as usize,
                    start: self.tick(before),
                    end: self.tick(before + ticks),
                    first_tick: before + 1,
                    ticks,
                }
            })
            .collect()
    }
}

/// A contiguous run of ticks `(start, end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub first_tick: u64,
    pub ticks: u64,
}

impl Chunk {
    pub fn tick_range(&self) -> std::ops::RangeInclusive<u64> {
        self.first_tick..=self.first_tick + self.ticks - 1
    }
}

/// Run `render` for every chunk and join the outputs in chunk order.
///
/// A single chunk returns its own error. With several, failed chunks are
/// logged and skipped, and an error is returned only when all of them fail.
fn generate_chunks<F>(chunks: &[Chunk], render: F) -> Result<Vec<u8>, GeneratorError>
where
    F: Fn(&Chunk) -> Result<Vec<u8>, GeneratorError> + Sync,
{
    if let [chunk] = chunks {
        return render(chunk);
    }

    let mut slots: Vec<Option<Vec<u8>>> = vec![None; chunks.len()];
    let render = &render;

    std::thread::scope(|scope| {
        for (slot, chunk) in slots.iter_mut().zip(chunks) {
            scope.spawn(move || match render(chunk) {
                Ok(output) => *slot = Some(output),
                Err(e) => error!(
                    chunk = chunk.index,
                    start = %chunk.start,
                    end = %chunk.end,
                    error = %e,
                    "Failed to generate chunk"
                ),
            });
        }
    });

    if slots.iter().all(Option::is_none) {
        return Err(GeneratorError::ChunksFailed {
            chunks: chunks.len(),
        });
    }

    Ok(slots.into_iter().flatten().flatten().collect())
}

/// A source of request payloads for the load driver.
pub trait PayloadGenerator: Send + Sync {
    /// Render `count` newline-terminated records stamped with `timestamp`.
    fn generate_batch(
        &self,
        count: usize,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<u8>, GeneratorError>;
}

/// Renders log records over time windows or in batches.
#[derive(Debug, Clone)]
pub struct LogsGenerator {
    renderer: Renderer,
    timestamp: TimestampFormat,
    seed: u64,
}

impl LogsGenerator {
    /// Create a generator.
    ///
    /// When the output format is a built-in one and no timestamp style was
    /// configured, the format's own style is used. A missing seed is drawn at
    /// random.
    pub fn new(renderer: Renderer, timestamp: TimestampFormat, seed: Option<u64>) -> Self {
        let timestamp = match renderer.format().default_timestamp_style() {
            Some(style) => timestamp.or_style(style),
            None => timestamp,
        };

        Self {
            renderer,
            timestamp,
            seed: seed.unwrap_or_else(rand::random),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp
    }

    /// Generate every tick of `window`, `records_per_tick` records each.
    ///
    /// With `parallelism > 1` the window is split into chunks generated on
    /// separate threads. A failed chunk is logged and left out; the remaining
    /// chunks are still returned in chronological order.
    ///
    /// # Errors
    ///
    /// With a single chunk any render failure is returned. With several, an
    /// error is returned only if every chunk failed.
    pub fn generate(
        &self,
        window: &TimeWindow,
        parallelism: usize,
        records_per_tick: usize,
    ) -> Result<Vec<u8>, GeneratorError> {
        let chunks = window.chunks(parallelism);
        debug!(
            ticks = window.tick_count(),
            chunks = chunks.len(),
            seed = self.seed,
            "Generating logs"
        );

        generate_chunks(&chunks, |chunk| self.generate_chunk(window, chunk, records_per_tick))
    }

    /// Generate the ticks of one chunk.
    pub fn generate_chunk(
        &self,
        window: &TimeWindow,
        chunk: &Chunk,
        records_per_tick: usize,
    ) -> Result<Vec<u8>, GeneratorError> {
        let mut out = Vec::new();

        for k in chunk.tick_range() {
            let mut rng = tick_rng(self.seed, k);
            self.write_records(window.tick(k), records_per_tick.max(1), &mut rng, &mut out)?;
        }

        Ok(out)
    }

    /// Render `count` records stamped with `timestamp` from the given source.
    pub fn generate_batch_with<R: Rng + ?Sized>(
        &self,
        count: usize,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<u8>, GeneratorError> {
        let mut out = Vec::new();
        self.write_records(timestamp, count, rng, &mut out)?;
        Ok(out)
    }

    fn write_records<R: Rng + ?Sized>(
        &self,
        instant: DateTime<Utc>,
        count: usize,
        rng: &mut R,
        out: &mut Vec<u8>,
    ) -> Result<(), GeneratorError> {
        let mut overrides = Map::new();
        overrides.insert(
            TIMESTAMP.to_string(),
            Value::String(self.timestamp.format(instant)),
        );

        for _ in 0..count {
            self.renderer.render_into(&overrides, rng, out)?;
            out.push(b'\n');
        }

        Ok(())
    }
}

impl PayloadGenerator for LogsGenerator {
    fn generate_batch(
        &self,
        count: usize,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<u8>, GeneratorError> {
        self.generate_batch_with(count, timestamp, &mut rand::thread_rng())
    }
}

/// The random source of tick `k`.
fn tick_rng(seed: u64, k: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(k.wrapping_mul(0x9E3779B97F4A7C15)))
}
