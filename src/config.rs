//! Configuration module for o11ybench.
//!
//! The configuration is a YAML document with an optional `generator` section
//! (what log records look like and over which time range they are written)
//! and an optional `loader` section (where, how fast and for how long they are
//! sent). Defaults are filled in after parsing and the whole document is
//! validated before any record is generated.
//!
//! A few loader settings can be overridden from the environment:
//! - `O11YBENCH_TARGET_HOST`: target host
//! - `O11YBENCH_TARGET_PORT`: target port
//! - `O11YBENCH_RATE`: requests per second across all workers
//! - `O11YBENCH_WORKERS`: number of concurrent workers
//! - `O11YBENCH_DURATION`: run duration (`30s`, `5m`, `0` for no limit)

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{Compression, LogClient};
use crate::formats::LogFormat;
use crate::generator::{LogsGenerator, TimeWindow};
use crate::renderer::{Format, Renderer, TokenSpec};
use crate::timestamp::{TimestampFormat, TimestampStyle, Zone, LOCAL_ZONE};

const ENV_TARGET_HOST: &str = "O11YBENCH_TARGET_HOST";
const ENV_TARGET_PORT: &str = "O11YBENCH_TARGET_PORT";
const ENV_RATE: &str = "O11YBENCH_RATE";
const ENV_WORKERS: &str = "O11YBENCH_WORKERS";
const ENV_DURATION: &str = "O11YBENCH_DURATION";

/// Default target host
const DEFAULT_HOST: &str = "localhost";

/// Default target port
const DEFAULT_PORT: u16 = 80;

const DEFAULT_METHOD: &str = "POST";

/// Default wait for response headers
const DEFAULT_RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a whole request
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default tick interval of the time window
const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,

    /// Config path or environment variable the error is about
    pub field: Option<String>,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    fn field(field: &str, message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "Configuration error for {}: {}", field, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderConfig>,
}

/// What to generate and over which time range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub logs: LogsConfig,
    pub time: TimeConfig,

    /// Random seed; drawn at random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogsConfig {
    pub format: FormatConfig,
    pub tokens: Vec<TokenSpec>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<LogFormat>,

    /// Custom `{{ .name }}` template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of ticks; shrinks an explicit end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    #[serde(with = "duration_text")]
    pub interval: Duration,

    /// Number of chunks generated concurrently
    pub parallel: usize,

    pub records_per_tick: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            count: None,
            interval: DEFAULT_INTERVAL,
            parallel: 1,
            records_per_tick: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    pub range: RangeConfig,
    pub timestamp: TimestampConfig,
}

/// RFC 3339 bounds of the time window; start defaults to now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RangeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimestampConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TimestampStyle>,

    /// strftime pattern; wins over `type`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,

    /// `Local`, `UTC` or an IANA zone name
    pub zone: String,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            kind: None,
            custom: None,
            zone: LOCAL_ZONE.to_string(),
        }
    }
}

/// How hard, how long and where to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Target requests per second across all workers
    pub rate: u64,

    pub workers: u64,

    /// Run duration; zero runs until interrupted
    #[serde(with = "duration_text")]
    pub duration: Duration,

    /// Records rendered into each request body
    pub records_per_request: usize,

    pub http: HttpConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            rate: 1,
            workers: 1,
            duration: Duration::ZERO,
            records_per_request: 1,
            http: HttpConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// The run duration, or `None` for a run without a deadline.
    pub fn run_duration(&self) -> Option<Duration> {
        Some(self.duration).filter(|d| !d.is_zero())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::field(
                "loader.workers",
                "must be at least 1",
            ));
        }

        if self.rate < self.workers {
            return Err(ConfigError::field(
                "loader.rate",
                format!(
                    "rate {} is lower than the number of workers {}",
                    self.rate, self.workers
                ),
            ));
        }

        if self.records_per_request == 0 {
            return Err(ConfigError::field(
                "loader.records_per_request",
                "must be at least 1",
            ));
        }

        if self.http.host.trim().is_empty() {
            return Err(ConfigError::field("loader.http.host", "must not be empty"));
        }

        if self.http.response_header_timeout.is_zero() {
            return Err(ConfigError::field(
                "loader.http.response_header_timeout",
                "must be positive",
            ));
        }

        LogClient::new(&self.http).map_err(|e| ConfigError::field("loader.http", e))?;

        Ok(())
    }
}

/// The HTTP target of the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub uri: String,
    pub method: String,
    pub compression: Compression,
    pub headers: BTreeMap<String, String>,

    #[serde(with = "duration_text")]
    pub response_header_timeout: Duration,

    #[serde(with = "duration_text")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uri: "/".to_string(),
            method: DEFAULT_METHOD.to_string(),
            compression: Compression::None,
            headers: BTreeMap::new(),
            response_header_timeout: DEFAULT_RESPONSE_HEADER_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GeneratorConfig {
    /// Compile the configured format, tokens and timestamp into a generator.
    pub fn build(&self) -> Result<LogsGenerator, ConfigError> {
        let format = &self.logs.format;
        let format = Format::new(format.kind, format.custom.as_deref())
            .map_err(|e| ConfigError::field("generator.logs.format", e))?;

        let renderer = Renderer::new(&self.logs.tokens, format)
            .map_err(|e| ConfigError::field("generator.logs.tokens", e))?;

        let timestamp = self.timestamp_format()?;

        Ok(LogsGenerator::new(renderer, timestamp, self.seed))
    }

    /// Resolve the time window, starting at `now` when no start is set.
    pub fn time_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, ConfigError> {
        let range = &self.time.range;
        let output = &self.logs.output;

        TimeWindow::resolve(
            range.start.unwrap_or(now),
            range.end,
            output.interval,
            output.count,
        )
        .map_err(|e| ConfigError::field("generator.time.range", e))
    }

    fn timestamp_format(&self) -> Result<TimestampFormat, ConfigError> {
        let timestamp = &self.time.timestamp;

        let zone = Zone::from_str(&timestamp.zone)
            .map_err(|e| ConfigError::field("generator.time.timestamp.zone", e))?;

        TimestampFormat::new(timestamp.kind, timestamp.custom.clone(), zone)
            .map_err(|e| ConfigError::field("generator.time.timestamp.custom", e))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logs.output.parallel == 0 {
            return Err(ConfigError::field(
                "generator.logs.output.parallel",
                "must be at least 1",
            ));
        }

        if self.logs.output.records_per_tick == 0 {
            return Err(ConfigError::field(
                "generator.logs.output.records_per_tick",
                "must be at least 1",
            ));
        }

        self.build()?;
        self.time_window(Utc::now())?;

        Ok(())
    }
}

impl Config {
    /// Load a configuration file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an
    /// environment override is malformed, or validation fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use o11ybench::config::Config;
    ///
    /// let config = Config::from_file("bench.yaml").expect("Failed to load config");
    /// if let Some(loader) = &config.loader {
    ///     println!("Target rate: {}/s", loader.rate);
    /// }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("failed to read {}: {}", path.display(), e)))?;

        let mut config = Self::parse(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate a YAML document, ignoring the environment.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(text)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(text).map_err(|e| ConfigError::new(e.to_string()))?;
        config.apply_defaults();
        Ok(config)
    }

    /// Fill in values that depend on other settings.
    fn apply_defaults(&mut self) {
        if let Some(generator) = &mut self.generator {
            let format = &mut generator.logs.format;
            if format.kind.is_none() && format.custom.is_none() {
                format.kind = Some(LogFormat::Json);
            }

            if generator.time.timestamp.zone.is_empty() {
                generator.time.timestamp.zone = LOCAL_ZONE.to_string();
            }
        }

        if let Some(loader) = &mut self.loader {
            if loader.http.method.is_empty() {
                loader.http.method = DEFAULT_METHOD.to_string();
            }
        }
    }

    /// Override loader settings from `O11YBENCH_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let host = env::var(ENV_TARGET_HOST).ok();
        let port = parse_env::<u16>(ENV_TARGET_PORT)?;
        let rate = parse_env::<u64>(ENV_RATE)?;
        let workers = parse_env::<u64>(ENV_WORKERS)?;
        let duration = match env::var(ENV_DURATION) {
            Ok(value) => Some(
                parse_duration(&value).map_err(|e| ConfigError::field(ENV_DURATION, e))?,
            ),
            Err(_) => None,
        };

        if host.is_none()
            && port.is_none()
            && rate.is_none()
            && workers.is_none()
            && duration.is_none()
        {
            return Ok(());
        }

        let loader = self.loader.get_or_insert_with(LoaderConfig::default);

        if let Some(host) = host {
            loader.http.host = host;
        }
        if let Some(port) = port {
            loader.http.port = port;
        }
        if let Some(rate) = rate {
            loader.rate = rate;
        }
        if let Some(workers) = workers {
            loader.workers = workers;
        }
        if let Some(duration) = duration {
            loader.duration = duration;
        }

        Ok(())
    }

    /// Check every section that is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(generator) = &self.generator {
            generator.validate()?;
        }

        if let Some(loader) = &self.loader {
            loader.validate()?;
        }

        Ok(())
    }

    /// The generator section, or an error naming the missing section.
    pub fn generator(&self) -> Result<&GeneratorConfig, ConfigError> {
        self.generator
            .as_ref()
            .ok_or_else(|| ConfigError::field("generator", "section is missing"))
    }

    /// The loader section, or an error naming the missing section.
    pub fn loader(&self) -> Result<&LoaderConfig, ConfigError> {
        self.loader
            .as_ref()
            .ok_or_else(|| ConfigError::field("loader", "section is missing"))
    }

    /// Render the effective configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::new(e.to_string()))
    }

    /// Print the effective configuration to stdout.
    pub fn print(&self) {
        match self.to_yaml() {
            Ok(yaml) => println!("--- config ---\n{}--------------", yaml),
            Err(e) => warn!(error = %e, "Failed to render configuration"),
        }
    }
}

fn parse_env<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| ConfigError {
            message: format!("'{}' is not a valid number", value),
            field: Some(var.to_string()),
        }),
        Err(_) => Ok(None),
    }
}

/// Parse a duration such as `500ms`, `5s`, `1m 30s`, `2h45m` or `0`.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(text).map_err(|e| format!("invalid duration '{}': {}", text, e))
}

/// Format a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Serde adapter for durations written as text, or as plain seconds.
mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => super::parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}
