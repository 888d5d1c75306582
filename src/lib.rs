//! o11ybench Library
//!
//! This library provides the pieces of a log ingestion benchmark:
//!
//! - **faker**, **distribution**, **units**: synthetic value providers and
//!   size distributions
//! - **template**, **formats**, **timestamp**, **renderer**: turning tokens into
//!   log records
//! - **generator**: time-windowed and batch record generation
//! - **client**, **loader**, **collector**: rate-controlled HTTP load with
//!   run statistics
//! - **config**: YAML configuration with environment overrides
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use o11ybench::collector::Collector;
//! use o11ybench::config::Config;
//! use o11ybench::loader::Loader;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Load configuration from file and environment
//!     let config = Config::from_file("bench.yaml").expect("Failed to load config");
//!
//!     // Render one time window
//!     let generator_config = config.generator().expect("No generator section");
//!     let generator = generator_config.build().expect("Invalid generator");
//!     let window = generator_config
//!         .time_window(chrono::Utc::now())
//!         .expect("Invalid time range");
//!     let logs = generator.generate(&window, 4, 1).expect("Generation failed");
//!     println!("{} bytes", logs.len());
//!
//!     // Drive the target for the configured duration
//!     let collector = Arc::new(Collector::new());
//!     let loader = Loader::new(
//!         config.loader().expect("No loader section"),
//!         Arc::new(generator),
//!         collector.clone(),
//!     )
//!     .expect("Failed to create loader");
//!     loader.run(std::future::pending()).await;
//!     collector.print();
//! }
//! ```

// Module declarations
pub mod client;
pub mod collector;
pub mod config;
pub mod distribution;
pub mod faker;
pub mod formats;
pub mod generator;
pub mod loader;
pub mod renderer;
pub mod template;
pub mod timestamp;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use client::{ClientError, Compression, LogClient};
pub use collector::{Collector, RunStats};
pub use config::{Config, ConfigError};
pub use distribution::{Distribution, DistributionError};
pub use faker::{FakeError, FakeKind};
pub use formats::LogFormat;
pub use generator::{GeneratorError, LogsGenerator, PayloadGenerator, TimeWindow};
pub use loader::{Loader, LoaderError, RunState};
pub use renderer::{Format, RenderError, Renderer, TokenSpec};
pub use timestamp::{TimestampFormat, TimestampStyle, Zone};
