//! Built-in log line formats.
//!
//! Each named format bundles a template, the tokens that fill it, and the
//! timestamp style the format is usually written with.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::faker::{FakeKind, Options};
use crate::renderer::TokenSpec;
use crate::timestamp::TimestampStyle;

// Reserved token names used by the built-in formats.
pub const HOST: &str = "host";
pub const USER_ID: &str = "userID";
pub const HTTP_METHOD: &str = "httpMethod";
pub const HTTP_VERSION: &str = "httpVersion";
pub const HTTP_STATUS_CODE: &str = "httpStatusCode";
pub const HTTP_URL: &str = "httpURL";
pub const HTTP_CONTENT_LENGTH: &str = "httpContentLength";
pub const HTTP_USER_AGENT: &str = "httpUserAgent";
pub const REFERER: &str = "referer";
pub const MESSAGE: &str = "message";
pub const MODULE: &str = "module";
pub const PID: &str = "pid";
pub const TID: &str = "tid";
pub const PORT: &str = "port";
pub const LOG_LEVEL: &str = "logLevel";
pub const PRIORITY: &str = "priority";
pub const APPLICATION: &str = "application";
pub const VERSION: &str = "version";
pub const MESSAGE_ID: &str = "messageID";
pub const STRUCTURED_DATA: &str = "structuredData";

/// The tick's rendered timestamp is injected under this name.
pub const TIMESTAMP: &str = "timestamp";

const APACHE_COMMON_TEMPLATE: &str = r#"{{ .host}} - {{ .userID}} [{{ .timestamp }}] "{{ .httpMethod }} {{ .httpURL }} {{ .httpVersion }}" {{ .httpStatusCode }} {{ .httpContentLength }}"#;

const APACHE_COMBINED_TEMPLATE: &str = r#"{{ .host}} - {{ .userID}} [{{ .timestamp }}] "{{ .httpMethod }} {{ .httpURL }} {{ .httpVersion }}" {{ .httpStatusCode }} {{ .httpContentLength }} "{{ .referer }}" "{{ .httpUserAgent }}""#;

const APACHE_ERROR_TEMPLATE: &str = "[{{ .timestamp }}] [{{ .module }}:{{ .logLevel }}] [pid {{ .pid }}:tid {{ .tid }}] [client {{ .host }}:{{ .port }}] {{ .message }}";

const RFC3164_TEMPLATE: &str =
    "<{{ .priority }}>{{ .timestamp }} {{ .host }} {{ .application }}[{{ .pid }}]: {{ .message }}";

const RFC5424_TEMPLATE: &str = "<{{ .priority }}>{{ .version }} {{ .timestamp }} {{ .host }} {{ .application }} {{ .pid }} ID{{ .messageID }} {{ .structuredData }} {{ .message }}";

/// The configurable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    ApacheCommon,
    ApacheCombined,
    ApacheError,
    Rfc3164,
    Rfc5424,
    /// One JSON object per record
    Json,
}

impl LogFormat {
    /// Get all supported formats.
    pub fn all() -> &'static [LogFormat] {
        &[
            LogFormat::ApacheCommon,
            LogFormat::ApacheCombined,
            LogFormat::ApacheError,
            LogFormat::Rfc3164,
            LogFormat::Rfc5424,
            LogFormat::Json,
        ]
    }

    /// The template, tokens and timestamp style of a text format.
    ///
    /// Returns `None` for [`LogFormat::Json`], which has no template.
    pub fn builtin(&self) -> Option<BuiltinFormat> {
        let format = match self {
            LogFormat::ApacheCommon => BuiltinFormat {
                template: APACHE_COMMON_TEMPLATE,
                tokens: apache_access_tokens(false),
                timestamp_style: TimestampStyle::Apache,
            },
            LogFormat::ApacheCombined => BuiltinFormat {
                template: APACHE_COMBINED_TEMPLATE,
                tokens: apache_access_tokens(true),
                timestamp_style: TimestampStyle::Apache,
            },
            LogFormat::ApacheError => BuiltinFormat {
                template: APACHE_ERROR_TEMPLATE,
                tokens: vec![
                    fake(MODULE, FakeKind::Words, json!({"count": 1})),
                    fake(LOG_LEVEL, FakeKind::LogLevel, json!({"type": "apache"})),
                    fake(PID, FakeKind::Number, json!({"min": 1, "max": 100000})),
                    fake(TID, FakeKind::Number, json!({"min": 1, "max": 100000})),
                    fake(HOST, FakeKind::Ipv4, json!({})),
                    fake(PORT, FakeKind::Number, json!({"min": 1, "max": 65535})),
                    fake(MESSAGE, FakeKind::HackerPhrase, json!({})),
                ],
                timestamp_style: TimestampStyle::ApacheError,
            },
            LogFormat::Rfc3164 => BuiltinFormat {
                template: RFC3164_TEMPLATE,
                tokens: vec![
                    fake(PRIORITY, FakeKind::Number, json!({"min": 0, "max": 191})),
                    fake(HOST, FakeKind::Username, json!({})),
                    fake(APPLICATION, FakeKind::Words, json!({"count": 1})),
                    fake(PID, FakeKind::Number, json!({"min": 1, "max": 10000})),
                    fake(MESSAGE, FakeKind::HackerPhrase, json!({})),
                ],
                timestamp_style: TimestampStyle::Rfc3164,
            },
            LogFormat::Rfc5424 => BuiltinFormat {
                template: RFC5424_TEMPLATE,
                tokens: vec![
                    fake(PRIORITY, FakeKind::Number, json!({"min": 0, "max": 191})),
                    fake(VERSION, FakeKind::Number, json!({"min": 1, "max": 3})),
                    fake(HOST, FakeKind::DomainName, json!({})),
                    fake(APPLICATION, FakeKind::Words, json!({"count": 1})),
                    fake(PID, FakeKind::Number, json!({"min": 1, "max": 10000})),
                    fake(MESSAGE_ID, FakeKind::Number, json!({"min": 1, "max": 1000})),
                    literal(STRUCTURED_DATA, json!("-")),
                    fake(MESSAGE, FakeKind::HackerPhrase, json!({})),
                ],
                timestamp_style: TimestampStyle::Rfc5424,
            },
            LogFormat::Json => return None,
        };

        Some(format)
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::ApacheCommon => write!(f, "apache_common"),
            LogFormat::ApacheCombined => write!(f, "apache_combined"),
            LogFormat::ApacheError => write!(f, "apache_error"),
            LogFormat::Rfc3164 => write!(f, "rfc3164"),
            LogFormat::Rfc5424 => write!(f, "rfc5424"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// A named text format.
#[derive(Debug, Clone)]
pub struct BuiltinFormat {
    pub template: &'static str,
    pub tokens: Vec<TokenSpec>,
    pub timestamp_style: TimestampStyle,
}

fn apache_access_tokens(combined: bool) -> Vec<TokenSpec> {
    let mut tokens = vec![
        fake(HOST, FakeKind::Ipv4, json!({})),
        fake(USER_ID, FakeKind::Username, json!({})),
        fake(HTTP_METHOD, FakeKind::HttpMethod, json!({})),
        fake(HTTP_URL, FakeKind::Uri, json!({"url": true})),
        fake(HTTP_VERSION, FakeKind::HttpVersion, json!({})),
        fake(HTTP_STATUS_CODE, FakeKind::HttpStatusCode, json!({})),
        fake(
            HTTP_CONTENT_LENGTH,
            FakeKind::Number,
            json!({"min": 100, "max": 100000}),
        ),
    ];

    if combined {
        tokens.push(fake(REFERER, FakeKind::Uri, json!({"url": true})));
        tokens.push(fake(HTTP_USER_AGENT, FakeKind::HttpUserAgent, json!({})));
    }

    tokens
}

fn fake(name: &str, kind: FakeKind, options: Value) -> TokenSpec {
    let options = match options {
        Value::Object(map) => map,
        _ => Options::new(),
    };

    TokenSpec {
        name: name.to_string(),
        kind: Some(kind),
        options,
        value: None,
        display: None,
    }
}

fn literal(name: &str, value: Value) -> TokenSpec {
    TokenSpec {
        name: name.to_string(),
        kind: None,
        options: Options::new(),
        value: Some(value),
        display: None,
    }
}
