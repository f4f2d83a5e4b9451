//! One HTTP exchange at a time.
//!
//! The dispatcher talks to the network only through the [`Transport`]
//! trait. [`HttpTransport`] is the reqwest-backed implementation bound once
//! to the credentials and timeout from [`Config`]; tests substitute their own.
//!
//! A transport returns every HTTP response it receives, whatever the status.
//! Classifying non-success statuses is the dispatcher's job; the transport
//! only fails when no response was obtained at all.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::FreshdeskError;
use crate::request::Method;

/// Password sent with the API key; Freshdesk ignores it but requires one.
pub const API_KEY_PASSWORD: &str = "X";

/// One outgoing HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Query pairs appended to the URL.
    pub query: Vec<(String, String)>,
}

/// An untouched HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body, exactly as received.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a header value as text. Names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as text, invalid UTF-8 replaced. For diagnostics only.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    timed_out: bool,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates an error from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
            source: None,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::new(message)
        }
    }

    /// Returns true if the exchange hit the configured timeout.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    /// Wraps a reqwest error, scrubbing the API key from its text.
    fn from_reqwest(err: reqwest::Error, api_key: &str) -> Self {
        let message = FreshdeskError::sanitize_message(&err.to_string(), api_key);
        Self {
            message,
            timed_out: err.is_timeout(),
            source: Some(Box::new(err)),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(f, "timed out: {}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the response, whatever its status.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with Basic auth.
#[derive(Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// API key for authentication.
    /// SECURITY: Never log this value!
    api_key: String,
}

impl HttpTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, FreshdeskError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                FreshdeskError::invalid_config(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_key: config.api_key().to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            query_params = request.query.len(),
            "Sending Freshdesk API request"
        );

        let mut req = self
            .http
            .request(request.method.into(), &request.url)
            .basic_auth(&self.api_key, Some(API_KEY_PASSWORD))
            .header(ACCEPT, "application/json")
            .header(
                USER_AGENT,
                concat!("freshdesk-rs/", env!("CARGO_PKG_VERSION")),
            );

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, &self.api_key))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, &self.api_key))?
            .to_vec();

        tracing::debug!(status, bytes = body.len(), "Received Freshdesk API response");
        tracing::trace!(body = %String::from_utf8_lossy(&body), "Freshdesk API response body");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let mut response = TransportResponse::new(200, "[]");
        response
            .headers
            .insert("link", HeaderValue::from_static("<https://x/y>; rel=\"next\""));

        assert_eq!(response.header("link"), Some("<https://x/y>; rel=\"next\""));
        assert_eq!(response.header("LINK"), Some("<https://x/y>; rel=\"next\""));
        assert_eq!(response.header("retry-after"), None);
    }

    #[test]
    fn test_response_is_success() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(301, "").is_success());
        assert!(!TransportResponse::new(404, "").is_success());
    }

    #[test]
    fn test_body_text_replaces_invalid_utf8() {
        let response = TransportResponse::new(200, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(response.body, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(response.body_text(), "caf\u{FFFD}");
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::new("connection refused").to_string(), "connection refused");
        let err = TransportError::timeout("after 30s");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out: after 30s");
    }
}
