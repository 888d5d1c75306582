//! o11ybench - synthetic log generation and ingestion load testing
//!
//! ## Commands
//!
//! - `o11ybench logs generate -c <config> [-o <file>]`: render the configured
//!   time window to a file, or to stdout
//! - `o11ybench logs start -c <config>`: send generated logs to the configured
//!   HTTP target at the configured rate, then print run statistics
//!
//! ## Environment
//!
//! - `O11YBENCH_TARGET_HOST`, `O11YBENCH_TARGET_PORT`, `O11YBENCH_RATE`,
//!   `O11YBENCH_WORKERS`, `O11YBENCH_DURATION`: override loader settings
//! - `RUST_LOG`: Logging level filter (default: info)

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use o11ybench::collector::Collector;
use o11ybench::config::Config;
use o11ybench::loader::{Loader, RunState};

#[derive(Parser, Debug)]
#[command(name = "o11ybench", version, about = "Observability ingestion benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log generation and load commands
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    /// Generate logs over the configured time range
    Generate {
        /// Path to the YAML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Send generated logs to the configured target
    Start {
        /// Path to the YAML configuration
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Logs { command } => match command {
            LogsCommand::Generate { config, output } => generate(&config, output.as_deref()),
            LogsCommand::Start { config } => start(&config).await,
        },
    };

    if let Err(e) = result {
        error!(error = %e, "o11ybench failed");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn generate(config_path: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    let generator_config = config.generator()?;

    let generator = generator_config.build()?;
    let window = generator_config.time_window(Utc::now())?;
    let output_config = &generator_config.logs.output;

    info!(
        start = %window.start(),
        end = %window.end(),
        ticks = window.tick_count(),
        parallel = output_config.parallel,
        seed = generator.seed(),
        "Generating logs"
    );

    let logs = generator.generate(&window, output_config.parallel, output_config.records_per_tick)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&logs)?;
            info!(path = %path.display(), bytes = logs.len(), "Logs written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&logs)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

async fn start(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    config.print();

    let generator = config.generator()?.build()?;
    let collector = Arc::new(Collector::new());
    let loader = Loader::new(config.loader()?, Arc::new(generator), collector.clone())?;

    info!("Load running. Press Ctrl+C to stop.");

    match loader.run(shutdown_signal()).await {
        RunState::Interrupted => {
            println!("Received interrupt or termination signal, printing stats before exit...");
            collector.print();
            std::process::exit(0);
        }
        _ => collector.print(),
    }

    Ok(())
}

/// Resolve on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
