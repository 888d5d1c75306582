//! Rate-controlled load driver.
//!
//! A [`Loader`] spreads a target request rate over a fixed pool of workers.
//! Each worker sends its share of the rate sequentially once per second and
//! sleeps out the rest of the second. Results are counted in a shared
//! [`Collector`].

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::{ClientError, LogClient};
use crate::collector::Collector;
use crate::config::LoaderConfig;
use crate::generator::{GeneratorError, PayloadGenerator};

/// Length of one pacing cycle
pub const PACING_CYCLE: Duration = Duration::from_secs(1);

/// Errors raised while setting up a run.
#[derive(Debug)]
pub enum LoaderError {
    /// HTTP client could not be built
    Client(ClientError),

    /// Invalid worker or rate settings
    InvalidSettings(String),
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            LoaderError::InvalidSettings(msg) => write!(f, "Invalid loader settings: {}", msg),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::Client(e) => Some(e),
            LoaderError::InvalidSettings(_) => None,
        }
    }
}

impl From<ClientError> for LoaderError {
    fn from(err: ClientError) -> Self {
        LoaderError::Client(err)
    }
}

/// Lifecycle of a [`Loader`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started yet
    #[default]
    Idle,

    /// Workers are sending requests
    Running,

    /// Every worker reached its deadline
    Completed,

    /// The shutdown future resolved first
    Interrupted,
}

/// Split `rate` over `workers`; the last worker takes the remainder.
pub fn worker_shares(rate: u64, workers: u64) -> Vec<u64> {
    if workers == 0 {
        return Vec::new();
    }

    let share = rate / workers;
    let mut shares = vec![share; workers as usize];
    if let Some(last) = shares.last_mut() {
        *last += rate % workers;
    }
    shares
}

/// Failure of a single request.
#[derive(Debug)]
enum RequestError {
    Generate(GeneratorError),
    Send(ClientError),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Generate(e) => write!(f, "{}", e),
            RequestError::Send(e) => write!(f, "{}", e),
        }
    }
}

/// State shared by every worker of a run.
struct Shared {
    client: LogClient,
    generator: Arc<dyn PayloadGenerator>,
    collector: Arc<Collector>,
    records_per_request: usize,
}

impl Shared {
    async fn send_one(&self) -> Result<(), RequestError> {
        let payload = self
            .generator
            .generate_batch(self.records_per_request, Utc::now())
            .map_err(RequestError::Generate)?;

        self.client
            .send(payload)
            .await
            .map_err(RequestError::Send)?;

        Ok(())
    }
}

/// One worker's slice of the run.
#[derive(Debug, Clone, Copy)]
struct Worker {
    id: u64,
    requests_per_cycle: u64,
    deadline: Option<Instant>,
}

impl Worker {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    async fn run(self, shared: Arc<Shared>) {
        debug!(worker = self.id, requests = self.requests_per_cycle, "Worker started");

        loop {
            if self.expired() {
                break;
            }

            let cycle_start = Instant::now();

            for _ in 0..self.requests_per_cycle {
                match shared.send_one().await {
                    Ok(()) => {
                        shared.collector.inc_success(1);
                        shared.collector.inc_records(shared.records_per_request as i64);
                    }
                    Err(e) => {
                        shared.collector.inc_failure(1);
                        warn!(worker = self.id, error = %e, "Request failed");
                    }
                }

                if self.expired() {
                    debug!(worker = self.id, "Worker reached deadline");
                    return;
                }
            }

            // Never sleep past the deadline
            let mut wake = cycle_start + PACING_CYCLE;
            if let Some(deadline) = self.deadline {
                wake = wake.min(deadline);
            }
            tokio::time::sleep_until(wake).await;
        }

        debug!(worker = self.id, "Worker reached deadline");
    }
}

/// Drives a worker pool against the configured HTTP target.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use o11ybench::collector::Collector;
/// use o11ybench::config::Config;
/// use o11ybench::loader::Loader;
///
/// #[tokio::main]
/// async fn main() {
///     let config = Config::from_file("bench.yaml").expect("Failed to load config");
///     let generator = config.generator().and_then(|g| g.build()).expect("Invalid generator");
///     let collector = Arc::new(Collector::new());
///
///     let loader = Loader::new(config.loader().unwrap(), Arc::new(generator), collector.clone())
///         .expect("Failed to create loader");
///     loader.run(async { tokio::signal::ctrl_c().await.ok(); }).await;
///     collector.print();
/// }
/// ```
pub struct Loader {
    shared: Arc<Shared>,
    shares: Vec<u64>,
    duration: Option<Duration>,
    state: RwLock<RunState>,
}

impl Loader {
    /// Create a loader for `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` when there are no workers or the rate is
    /// lower than the worker count, and `Client` when the HTTP client cannot
    /// be built.
    pub fn new(
        config: &LoaderConfig,
        generator: Arc<dyn PayloadGenerator>,
        collector: Arc<Collector>,
    ) -> Result<Self, LoaderError> {
        if config.workers == 0 {
            return Err(LoaderError::InvalidSettings(
                "at least one worker is required".to_string(),
            ));
        }

        if config.rate < config.workers {
            return Err(LoaderError::InvalidSettings(format!(
                "rate {} is lower than the number of workers {}",
                config.rate, config.workers
            )));
        }

        let client = LogClient::new(&config.http)?;

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                generator,
                collector,
                records_per_request: config.records_per_request.max(1),
            }),
            shares: worker_shares(config.rate, config.workers),
            duration: config.run_duration(),
            state: RwLock::new(RunState::Idle),
        })
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.shared.collector
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state.read().map(|s| *s).unwrap_or_default()
    }

    fn set_state(&self, state: RunState) {
        if let Ok(mut current) = self.state.write() {
            *current = state;
        }
    }

    /// Run until every worker reaches the deadline or `shutdown` resolves.
    ///
    /// The state is `Running` while workers are active and holds the
    /// returned end state afterwards.
    ///
    /// Without a duration the run only ends through `shutdown`. On shutdown
    /// the workers are aborted and in-flight requests are abandoned. The
    /// collector is stopped in both cases, so its statistics are final when
    /// this returns.
    pub async fn run<F>(&self, shutdown: F) -> RunState
    where
        F: Future<Output = ()>,
    {
        let collector = &self.shared.collector;
        collector.start();
        self.set_state(RunState::Running);

        let deadline = self.duration.map(|d| Instant::now() + d);

        info!(
            url = %self.shared.client.url(),
            workers = self.shares.len(),
            rate = self.shares.iter().sum::<u64>(),
            duration = ?self.duration,
            "Load started"
        );

        let mut workers = JoinSet::new();
        for (id, requests_per_cycle) in self.shares.iter().enumerate() {
            let worker = Worker {
                id: id as u64,
                requests_per_cycle: *requests_per_cycle,
                deadline,
            };
            workers.spawn(worker.run(self.shared.clone()));
        }

        let interrupted = tokio::select! {
            _ = drain(&mut workers) => false,
            _ = shutdown => true,
        };

        let state = if interrupted {
            workers.abort_all();
            info!("Load interrupted");
            RunState::Interrupted
        } else {
            info!("Load completed");
            RunState::Completed
        };

        collector.stop();
        self.set_state(state);
        state
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "Worker task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use chrono::{DateTime, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Emits one fixed line per record.
    struct FixedPayload;

    impl PayloadGenerator for FixedPayload {
        fn generate_batch(
            &self,
            count: usize,
            _timestamp: DateTime<Utc>,
        ) -> Result<Vec<u8>, GeneratorError> {
            Ok(b"{\"message\":\"hello\"}\n".repeat(count))
        }
    }

    struct FailingPayload;

    impl PayloadGenerator for FailingPayload {
        fn generate_batch(
            &self,
            _count: usize,
            _timestamp: DateTime<Utc>,
        ) -> Result<Vec<u8>, GeneratorError> {
            Err(GeneratorError::ChunksFailed { chunks: 1 })
        }
    }

    fn loader_config(server: &MockServer, rate: u64, workers: u64, duration: Duration) -> LoaderConfig {
        let address = server.address();
        LoaderConfig {
            rate,
            workers,
            duration,
            records_per_request: 10,
            http: HttpConfig {
                host: address.ip().to_string(),
                port: address.port(),
                uri: "/ingest".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_worker_shares() {
        assert_eq!(worker_shares(100, 10), vec![10; 10]);
        assert_eq!(worker_shares(10, 3), vec![3, 3, 4]);
        assert_eq!(worker_shares(7, 1), vec![7]);
        assert!(worker_shares(5, 0).is_empty());

        for (rate, workers) in [(101, 7), (1000, 33), (5, 5)] {
            assert_eq!(worker_shares(rate, workers).iter().sum::<u64>(), rate);
        }
    }

    #[test]
    fn test_invalid_settings() {
        let collector = Arc::new(Collector::new());
        let mut config = LoaderConfig::default();

        config.workers = 0;
        assert!(matches!(
            Loader::new(&config, Arc::new(FixedPayload), collector.clone()),
            Err(LoaderError::InvalidSettings(_))
        ));

        config.workers = 10;
        config.rate = 5;
        assert!(matches!(
            Loader::new(&config, Arc::new(FixedPayload), collector),
            Err(LoaderError::InvalidSettings(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sustains_target_rate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let collector = Arc::new(Collector::new());
        let config = loader_config(&server, 100, 10, Duration::from_secs(2));
        let loader = Loader::new(&config, Arc::new(FixedPayload), collector.clone()).unwrap();

        assert_eq!(loader.state(), RunState::Idle);

        let state = loader.run(std::future::pending()).await;
        assert_eq!(state, RunState::Completed);
        assert_eq!(loader.state(), RunState::Completed);

        let stats = collector.snapshot();
        assert_eq!(stats.failure, 0);
        assert_eq!(stats.records, stats.success * 10);
        assert!(
            (stats.rate - 100.0).abs() <= 1.0,
            "rate {} not within 1 of 100",
            stats.rate
        );
        assert!(
            stats.duration >= Duration::from_secs(1) && stats.duration <= Duration::from_secs(3),
            "duration {:?}",
            stats.duration
        );
    }

    #[tokio::test]
    async fn test_error_status_counts_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let collector = Arc::new(Collector::new());
        let config = loader_config(&server, 5, 1, Duration::from_millis(500));
        let loader = Loader::new(&config, Arc::new(FixedPayload), collector.clone()).unwrap();

        assert_eq!(loader.run(std::future::pending()).await, RunState::Completed);
        assert_eq!(collector.success(), 0);
        assert_eq!(collector.records(), 0);
        assert_eq!(collector.failure(), 5);
    }

    #[tokio::test]
    async fn test_generation_failure_counts_failures() {
        let server = MockServer::start().await;

        let collector = Arc::new(Collector::new());
        let config = loader_config(&server, 3, 1, Duration::from_millis(200));
        let loader = Loader::new(&config, Arc::new(FailingPayload), collector.clone()).unwrap();

        loader.run(std::future::pending()).await;
        assert_eq!(collector.failure(), 3);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_stops_infinite_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let collector = Arc::new(Collector::new());
        let config = loader_config(&server, 4, 2, Duration::ZERO);
        let loader = Loader::new(&config, Arc::new(FixedPayload), collector.clone()).unwrap();

        let shutdown = async {
            assert_eq!(loader.state(), RunState::Running);
            tokio::time::sleep(Duration::from_millis(300)).await;
        };
        let state = loader.run(shutdown).await;

        assert_eq!(state, RunState::Interrupted);
        assert_eq!(loader.state(), RunState::Interrupted);
        assert_eq!(collector.success(), 4);
        assert!(collector.duration() >= Duration::from_millis(300));
        assert!(collector.duration() < Duration::from_secs(1));
    }
}
