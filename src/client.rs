//! HTTP sink for generated payloads.
//!
//! This module wraps a pooled reqwest client with the target URL, method,
//! headers and compression of the load test, so that a worker only hands over
//! a payload.

use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::HttpConfig;

/// Payload compression applied before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Errors that can occur while sending a payload.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed
    Request(reqwest::Error),

    /// Server answered with a non-success status code
    Status { code: StatusCode, body: String },

    /// No response headers within the configured time
    Timeout,

    /// Client configuration error
    Config(String),

    /// Payload compression failed
    Compression(std::io::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Request(e) => write!(f, "HTTP request failed: {}", e),
            ClientError::Status { code, body } => {
                write!(f, "Server error ({}): {}", code, body)
            }
            ClientError::Timeout => write!(f, "Request timed out"),
            ClientError::Config(e) => write!(f, "Client configuration error: {}", e),
            ClientError::Compression(e) => write!(f, "Failed to compress payload: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(e) => Some(e),
            ClientError::Compression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(err)
        }
    }
}

/// A successful response from the sink.
#[derive(Debug, Clone)]
pub struct SinkResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Gzip `payload`.
pub fn gzip(payload: &[u8]) -> Result<Vec<u8>, ClientError> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(payload)
        .map_err(ClientError::Compression)?;
    encoder.finish().map_err(ClientError::Compression)
}

/// Build `http://host:port/uri`.
pub fn target_url(host: &str, port: u16, uri: &str) -> String {
    format!("http://{}:{}/{}", host, port, uri.trim_start_matches('/'))
}

/// HTTP client sending payloads to the load test target.
///
/// The underlying reqwest client is shared by every worker, so connections
/// are pooled across them.
///
/// # Example
///
/// ```no_run
/// use o11ybench::client::LogClient;
/// use o11ybench::config::HttpConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let http = HttpConfig {
///         host: "localhost".to_string(),
///         port: 4000,
///         uri: "/v1/ingest".to_string(),
///         ..Default::default()
///     };
///     let client = LogClient::new(&http).expect("Failed to create client");
///
///     match client.send(b"hello\n".to_vec()).await {
///         Ok(response) => println!("Sent, status {}", response.status),
///         Err(e) => eprintln!("Failed to send: {}", e),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LogClient {
    /// The underlying HTTP client (reused for connection pooling)
    client: Client,

    /// Full target URL
    url: String,

    method: Method,

    /// Configured headers, plus `Content-Encoding` when compressing
    headers: HeaderMap,

    compression: Compression,

    /// Maximum wait for the response headers
    response_header_timeout: Duration,
}

impl LogClient {
    /// Create a client for the configured target.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` for an invalid method or header, or if
    /// the HTTP client cannot be built.
    pub fn new(http: &HttpConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(http.request_timeout)
            .pool_max_idle_per_host(64)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let method = Method::from_bytes(http.method.to_uppercase().as_bytes())
            .map_err(|_| ClientError::Config(format!("invalid HTTP method '{}'", http.method)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &http.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid value for header '{}'", name)))?;
            headers.insert(name, value);
        }

        if http.compression == Compression::Gzip {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        Ok(Self {
            client,
            url: target_url(&http.host, http.port, &http.uri),
            method,
            headers,
            compression: http.compression,
            response_header_timeout: http.response_header_timeout,
        })
    }

    /// Compress (if configured) and send one payload.
    pub async fn send(&self, payload: Vec<u8>) -> Result<SinkResponse, ClientError> {
        let body = match self.compression {
            Compression::Gzip => gzip(&payload)?,
            Compression::None => payload,
        };

        self.request(&self.method, &self.url, &self.headers, body)
            .await
    }

    /// Send a raw request and read the whole response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` for any non-2xx status, and
    /// `ClientError::Timeout` if the response headers do not arrive in time.
    pub async fn request(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<SinkResponse, ClientError> {
        debug!(method = %method, url = %url, bytes = body.len(), "Sending payload");

        let pending = self
            .client
            .request(method.clone(), url)
            .headers(headers.clone())
            .body(body)
            .send();

        let response = tokio::time::timeout(self.response_header_timeout, pending)
            .await
            .map_err(|_| ClientError::Timeout)??;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(SinkResponse { status, body })
        } else {
            Err(ClientError::Status { code: status, body })
        }
    }

    /// Get the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}
