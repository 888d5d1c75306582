//! Synthetic value providers.
//!
//! Every token that is not a literal names a [`FakeKind`] plus a loosely typed
//! options map. The options are decoded and validated once, when the token is
//! compiled into a [`Provider`]; afterwards producing a value is a plain
//! `match` on the provider with an injected random source.

pub mod dataset;
pub mod http;
pub mod identity;
pub mod log_level;
pub mod number;
pub mod words;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::distribution::DistributionError;

/// Loosely typed per-kind options, as written in the configuration.
pub type Options = serde_json::Map<String, Value>;

/// The fixed catalogue of value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FakeKind {
    Words,
    Number,
    Ipv4,
    Username,
    UserId,
    Uri,
    HttpVersion,
    HttpMethod,
    HttpStatusCode,
    HttpUserAgent,
    LogLevel,
    HackerPhrase,
    Uuid,
    DomainName,
    Logs,
}

impl FakeKind {
    /// Get all supported kinds.
    pub fn all() -> &'static [FakeKind] {
        &[
            FakeKind::Words,
            FakeKind::Number,
            FakeKind::Ipv4,
            FakeKind::Username,
            FakeKind::UserId,
            FakeKind::Uri,
            FakeKind::HttpVersion,
            FakeKind::HttpMethod,
            FakeKind::HttpStatusCode,
            FakeKind::HttpUserAgent,
            FakeKind::LogLevel,
            FakeKind::HackerPhrase,
            FakeKind::Uuid,
            FakeKind::DomainName,
            FakeKind::Logs,
        ]
    }

    /// The configuration name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            FakeKind::Words => "words",
            FakeKind::Number => "number",
            FakeKind::Ipv4 => "ipv4",
            FakeKind::Username => "username",
            FakeKind::UserId => "userId",
            FakeKind::Uri => "uri",
            FakeKind::HttpVersion => "httpVersion",
            FakeKind::HttpMethod => "httpMethod",
            FakeKind::HttpStatusCode => "httpStatusCode",
            FakeKind::HttpUserAgent => "httpUserAgent",
            FakeKind::LogLevel => "logLevel",
            FakeKind::HackerPhrase => "hackerPhrase",
            FakeKind::Uuid => "uuid",
            FakeKind::DomainName => "domainName",
            FakeKind::Logs => "logs",
        }
    }
}

impl std::fmt::Display for FakeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FakeKind {
    type Err = FakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FakeKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FakeError::UnknownKind(s.to_string()))
    }
}

/// Errors raised while compiling or running a value provider.
#[derive(Debug)]
pub enum FakeError {
    /// The kind name is not part of the catalogue
    UnknownKind(String),

    /// The options could not be decoded or are inconsistent
    InvalidOptions { kind: FakeKind, message: String },

    /// A size distribution in the options is invalid
    Distribution {
        kind: FakeKind,
        source: DistributionError,
    },
}

impl FakeError {
    pub(crate) fn invalid(kind: FakeKind, message: impl Into<String>) -> Self {
        FakeError::InvalidOptions {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FakeError::UnknownKind(kind) => write!(f, "unknown fake data kind: {}", kind),
            FakeError::InvalidOptions { kind, message } => {
                write!(f, "invalid options for '{}': {}", kind, message)
            }
            FakeError::Distribution { kind, source } => {
                write!(f, "invalid size distribution for '{}': {}", kind, source)
            }
        }
    }
}

impl std::error::Error for FakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FakeError::Distribution { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Decode the options map into the typed options of one kind.
///
/// An empty map decodes to the type's default.
pub(crate) fn parse_options<T>(kind: FakeKind, options: &Options) -> Result<T, FakeError>
where
    T: DeserializeOwned + Default,
{
    if options.is_empty() {
        return Ok(T::default());
    }

    serde_json::from_value(Value::Object(options.clone()))
        .map_err(|e| FakeError::invalid(kind, e.to_string()))
}

/// A value provider with its options decoded and validated.
#[derive(Debug, Clone)]
pub enum Provider {
    Words(words::WordsProvider),
    Number(number::NumberProvider),
    Ipv4,
    Username,
    UserId,
    Uri(http::UriOptions),
    HttpVersion,
    HttpMethod,
    HttpStatusCode,
    HttpUserAgent,
    LogLevel(log_level::LogLevelProvider),
    HackerPhrase,
    Uuid,
    DomainName,
    Logs(dataset::LogsProvider),
}

impl Provider {
    /// Compile a provider for `kind` from its raw options.
    pub fn new(kind: FakeKind, options: &Options) -> Result<Self, FakeError> {
        let provider = match kind {
            FakeKind::Words => Provider::Words(words::WordsProvider::new(options)?),
            FakeKind::Number => Provider::Number(number::NumberProvider::new(options)?),
            FakeKind::Uri => Provider::Uri(parse_options(kind, options)?),
            FakeKind::LogLevel => Provider::LogLevel(log_level::LogLevelProvider::new(options)?),
            FakeKind::Logs => Provider::Logs(dataset::LogsProvider::new(options)?),
            FakeKind::Ipv4 => Provider::Ipv4,
            FakeKind::Username => Provider::Username,
            FakeKind::UserId => Provider::UserId,
            FakeKind::HttpVersion => Provider::HttpVersion,
            FakeKind::HttpMethod => Provider::HttpMethod,
            FakeKind::HttpStatusCode => Provider::HttpStatusCode,
            FakeKind::HttpUserAgent => Provider::HttpUserAgent,
            FakeKind::HackerPhrase => Provider::HackerPhrase,
            FakeKind::Uuid => Provider::Uuid,
            FakeKind::DomainName => Provider::DomainName,
        };

        Ok(provider)
    }

    /// Produce one value.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            Provider::Words(p) => Value::String(p.generate(rng)),
            Provider::Number(p) => p.generate(rng),
            Provider::Ipv4 => Value::String(identity::ipv4(rng)),
            Provider::Username => Value::String(identity::username(rng)),
            Provider::UserId => Value::from(identity::user_id(rng)),
            Provider::Uri(opts) => Value::String(http::uri(rng, opts)),
            Provider::HttpVersion => Value::String(http::version(rng).to_string()),
            Provider::HttpMethod => Value::String(http::method(rng).to_string()),
            Provider::HttpStatusCode => Value::from(http::status_code(rng)),
            Provider::HttpUserAgent => Value::String(http::user_agent(rng)),
            Provider::LogLevel(p) => Value::String(p.generate(rng)),
            Provider::HackerPhrase => Value::String(words::hacker_phrase(rng)),
            Provider::Uuid => Value::String(identity::uuid(rng)),
            Provider::DomainName => Value::String(identity::domain_name(rng)),
            Provider::Logs(p) => Value::String(p.generate(rng)),
        }
    }
}

/// Compile and run a provider in one step.
///
/// Prefer compiling a [`Provider`] once when generating many values.
pub fn fake<R: Rng + ?Sized>(
    kind: FakeKind,
    options: &Options,
    rng: &mut R,
) -> Result<Value, FakeError> {
    Ok(Provider::new(kind, options)?.generate(rng))
}
