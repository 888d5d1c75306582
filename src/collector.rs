//! Run statistics shared by the load workers.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct Timing {
    start: Option<Instant>,
    duration: Option<Duration>,
}

/// Lock-free counters plus start/stop bookkeeping.
///
/// Counters may be bumped from any task. `start` and `stop` are meant to be
/// called once each by the task that owns the run.
#[derive(Debug, Default)]
pub struct Collector {
    success: AtomicI64,
    failure: AtomicI64,
    records: AtomicI64,
    timing: RwLock<Timing>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start instant.
    pub fn start(&self) {
        if let Ok(mut timing) = self.timing.write() {
            timing.start = Some(Instant::now());
            timing.duration = None;
        }
    }

    /// Record the elapsed time since [`start`](Self::start).
    ///
    /// Stopping a collector that was never started leaves the duration at zero.
    pub fn stop(&self) {
        if let Ok(mut timing) = self.timing.write() {
            timing.duration = Some(timing.start.map(|s| s.elapsed()).unwrap_or_default());
        }
    }

    pub fn inc_success(&self, n: i64) {
        self.success.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_failure(&self, n: i64) {
        self.failure.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_records(&self, n: i64) {
        self.records.fetch_add(n, Ordering::Relaxed);
    }

    pub fn success(&self) -> i64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure(&self) -> i64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn records(&self) -> i64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Elapsed time between `start` and `stop`; zero before `stop`.
    pub fn duration(&self) -> Duration {
        self.timing
            .read()
            .ok()
            .and_then(|t| t.duration)
            .unwrap_or_default()
    }

    /// Successful requests per second.
    pub fn rate(&self) -> f64 {
        per_second(self.success(), self.duration())
    }

    /// Ingested records per second.
    pub fn records_rate(&self) -> f64 {
        per_second(self.records(), self.duration())
    }

    /// A point-in-time copy of the statistics.
    pub fn snapshot(&self) -> RunStats {
        let duration = self.duration();

        RunStats {
            success: self.success(),
            failure: self.failure(),
            records: self.records(),
            duration,
            rate: per_second(self.success(), duration),
            records_rate: per_second(self.records(), duration),
        }
    }

    /// Print the statistics to stdout.
    pub fn print(&self) {
        println!("{}", self.snapshot());
    }
}

fn per_second(count: i64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Statistics of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub success: i64,
    pub failure: i64,
    pub records: i64,
    pub duration: Duration,
    pub rate: f64,
    pub records_rate: f64,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Success: {}, Failure: {}, Duration: {:?}, Rate: {:.6}",
            self.success, self.failure, self.duration, self.rate
        )?;
        write!(
            f,
            "Ingested records: {}, records/s: {:.6}",
            self.records, self.records_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters_from_many_threads() {
        let collector = Arc::new(Collector::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = collector.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc_success(1);
                        c.inc_records(10);
                    }
                    c.inc_failure(1);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.success(), 8000);
        assert_eq!(collector.records(), 80000);
        assert_eq!(collector.failure(), 8);
    }

    #[test]
    fn test_rates_before_stop_are_zero() {
        let collector = Collector::new();
        collector.start();
        collector.inc_success(5);

        assert_eq!(collector.duration(), Duration::ZERO);
        assert_eq!(collector.rate(), 0.0);
        assert_eq!(collector.records_rate(), 0.0);
    }

    #[test]
    fn test_rate_after_stop() {
        let collector = Collector::new();
        collector.start();
        std::thread::sleep(Duration::from_millis(100));
        collector.inc_success(10);
        collector.inc_records(50);
        collector.stop();

        let duration = collector.duration();
        assert!(duration >= Duration::from_millis(100));

        let expected = 10.0 / duration.as_secs_f64();
        assert!((collector.rate() - expected).abs() < 1e-9);
        assert!((collector.records_rate() - 5.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn test_stop_without_start() {
        let collector = Collector::new();
        collector.stop();
        assert_eq!(collector.duration(), Duration::ZERO);
    }

    #[test]
    fn test_stats_display() {
        let stats = RunStats {
            success: 200,
            failure: 1,
            records: 2000,
            duration: Duration::from_secs(2),
            rate: 100.0,
            records_rate: 1000.0,
        };

        assert_eq!(
            stats.to_string(),
            "Success: 200, Failure: 1, Duration: 2s, Rate: 100.000000\n\
             Ingested records: 2000, records/s: 1000.000000"
        );
    }
}
