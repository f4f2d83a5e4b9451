//! Error types for the Freshdesk client.
//!
//! This module defines `FreshdeskError`, the error taxonomy every call
//! through [`FreshdeskClient`](crate::client::FreshdeskClient) returns.
//! HTTP statuses the Freshdesk API documents are mapped to dedicated
//! variants so callers can branch on the kind of failure; everything else
//! lands in [`FreshdeskError::Api`] with the status and decoded payload kept.
//!
//! # Security
//!
//! Response bodies captured into errors are sanitized so the API key never
//! shows up in logs or error messages. Use `sanitize_message()` when building
//! messages from external sources.

use std::fmt;
use std::time::{Duration, SystemTime};

use reqwest::header::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

use crate::request::Method;
use crate::transport::TransportError;

/// Maximum length for captured error bodies.
pub(crate) const MAX_ERROR_BODY_LEN: usize = 500;

/// Unified error type for all Freshdesk operations.
#[derive(Error, Debug)]
pub enum FreshdeskError {
    /// Configuration error - missing or invalid credentials or settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// The API key was rejected (HTTP 401).
    #[error("authentication failed for {0} - check the API key")]
    Authentication(ApiErrorContext),

    /// The credentials are valid but lack permission (HTTP 403).
    #[error("access denied for {0}")]
    AccessDenied(ApiErrorContext),

    /// The operation conflicts with the current remote state (HTTP 409).
    #[error("conflicting state for {0}")]
    ConflictingState(ApiErrorContext),

    /// The account's rate limit was exceeded (HTTP 429).
    #[error("rate limit exceeded for {context}")]
    RateLimitExceeded {
        /// Delay suggested by the `Retry-After` header, if any.
        retry_after: Option<Duration>,
        /// Rate limit counters reported alongside the failure.
        rate_limit: RateLimitInfo,
        /// Request and response details.
        context: ApiErrorContext,
    },

    /// The request body had a content type the API does not accept (HTTP 415).
    #[error("unsupported content type for {0}")]
    UnsupportedContentType(ApiErrorContext),

    /// Any other non-success response, including 404.
    #[error("API error for {0}")]
    Api(ApiErrorContext),

    /// No HTTP response was obtained.
    #[error("transport failure during {method} {endpoint}: {source}")]
    Transport {
        /// Method of the failed request.
        method: Method,
        /// Endpoint or absolute URL of the failed request.
        endpoint: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// A successful response did not carry the JSON the dispatcher expected.
    #[error("could not decode response to {method} {endpoint} (HTTP {status}): {message}")]
    Decode {
        /// Method of the request.
        method: Method,
        /// Endpoint or absolute URL of the request.
        endpoint: String,
        /// HTTP status of the response.
        status: u16,
        /// What went wrong.
        message: String,
    },

    /// A `link` header pointed somewhere the client will not follow.
    #[error("invalid next-page link {link:?}: {reason}")]
    InvalidPageLink {
        /// The link as extracted from the header.
        link: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The remote kept advertising further pages past the configured bound.
    #[error("pagination of {endpoint} exceeded {max_pages} pages")]
    PageLimitExceeded {
        /// Endpoint of the original request.
        endpoint: String,
        /// The configured page bound.
        max_pages: usize,
    },

    /// A method name other than GET, POST, PUT or DELETE.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Diagnostics carried by every status-mapped error.
#[derive(Debug, Clone)]
pub struct ApiErrorContext {
    /// Method of the failed request.
    pub method: Method,
    /// Endpoint or absolute URL of the failed request.
    pub endpoint: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Response body, sanitized and truncated.
    pub raw_body: String,
    /// The decoded Freshdesk error body, when it parsed.
    pub payload: Option<ApiErrorPayload>,
}

impl fmt::Display for ApiErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(summary) = self.payload.as_ref().and_then(ApiErrorPayload::summary) {
            write!(f, ": {}", summary)?;
        }
        Ok(())
    }
}

/// Error body returned by the Freshdesk API.
///
/// Validation failures look like
/// `{"description": "Validation failed", "errors": [{"field": ..., "message": ..., "code": ...}]}`
/// while authentication and permission failures use `{"code": ..., "message": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiErrorPayload {
    /// Top-level description.
    #[serde(default)]
    pub description: Option<String>,

    /// Top-level error code.
    #[serde(default)]
    pub code: Option<String>,

    /// Top-level message.
    #[serde(default)]
    pub message: Option<String>,

    /// Per-field errors.
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ApiErrorPayload {
    /// Parses a response body, returning `None` unless it is a JSON object.
    pub fn parse(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Error codes of all field errors, in order.
    pub fn codes(&self) -> Vec<&str> {
        self.errors.iter().filter_map(|e| e.code.as_deref()).collect()
    }

    /// One-line human summary, if the payload says anything at all.
    pub fn summary(&self) -> Option<String> {
        let head = self
            .description
            .as_deref()
            .or(self.message.as_deref())
            .or(self.code.as_deref());

        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| match (&e.field, &e.message) {
                (Some(field), Some(message)) => format!("{}: {}", field, message),
                (None, Some(message)) => message.clone(),
                (Some(field), None) => field.clone(),
                (None, None) => e.code.clone().unwrap_or_default(),
            })
            .filter(|s| !s.is_empty())
            .collect();

        match (head, fields.is_empty()) {
            (Some(head), true) => Some(head.to_string()),
            (Some(head), false) => Some(format!("{} ({})", head, fields.join("; "))),
            (None, false) => Some(fields.join("; ")),
            (None, true) => None,
        }
    }
}

/// A single field-level error inside [`ApiErrorPayload`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldError {
    /// The offending field.
    #[serde(default)]
    pub field: Option<String>,
    /// What is wrong with it.
    #[serde(default)]
    pub message: Option<String>,
    /// Machine-readable code, e.g. `invalid_value`.
    #[serde(default)]
    pub code: Option<String>,
}

/// Rate limit counters Freshdesk reports in response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `Retry-After` as a delay. An HTTP-date already in the past is zero.
    pub retry_after: Option<Duration>,
    /// `Retry-After` exactly as sent.
    pub retry_after_raw: Option<String>,
    /// `X-Ratelimit-Total`.
    pub total: Option<u64>,
    /// `X-Ratelimit-Remaining`.
    pub remaining: Option<u64>,
    /// `X-Ratelimit-Used-CurrentRequest`.
    pub used_current_request: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let retry_after_raw = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string());
        Self {
            retry_after: retry_after_raw.as_deref().and_then(parse_retry_after),
            retry_after_raw,
            total: header_u64(headers, "x-ratelimit-total"),
            remaining: header_u64(headers, "x-ratelimit-remaining"),
            used_current_request: header_u64(headers, "x-ratelimit-used-currentrequest"),
        }
    }
}

/// Parses `Retry-After` in either delay-seconds or HTTP-date form.
fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = httpdate::parse_http_date(value).ok()?;
    Some(
        date.duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

impl FreshdeskError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        FreshdeskError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        FreshdeskError::Config(message.into())
    }

    /// Creates an invalid page link error.
    pub fn invalid_page_link(link: impl Into<String>, reason: impl Into<String>) -> Self {
        FreshdeskError::InvalidPageLink {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Maps a non-success response to the matching variant.
    ///
    /// `raw_body` should already be sanitized.
    pub(crate) fn from_status(
        method: Method,
        endpoint: &str,
        status: u16,
        headers: &HeaderMap,
        raw_body: String,
    ) -> Self {
        let payload = ApiErrorPayload::parse(&raw_body);
        let raw_body = truncate_body(raw_body);
        let context = ApiErrorContext {
            method,
            endpoint: endpoint.to_string(),
            status: Some(status),
            raw_body,
            payload,
        };

        match status {
            401 => FreshdeskError::Authentication(context),
            403 => FreshdeskError::AccessDenied(context),
            409 => FreshdeskError::ConflictingState(context),
            415 => FreshdeskError::UnsupportedContentType(context),
            429 => {
                let rate_limit = RateLimitInfo::from_headers(headers);
                FreshdeskError::RateLimitExceeded {
                    retry_after: rate_limit.retry_after,
                    rate_limit,
                    context,
                }
            }
            _ => FreshdeskError::Api(context),
        }
    }

    /// Returns the request/response context for status-mapped errors.
    pub fn context(&self) -> Option<&ApiErrorContext> {
        match self {
            FreshdeskError::Authentication(ctx)
            | FreshdeskError::AccessDenied(ctx)
            | FreshdeskError::ConflictingState(ctx)
            | FreshdeskError::UnsupportedContentType(ctx)
            | FreshdeskError::Api(ctx) => Some(ctx),
            FreshdeskError::RateLimitExceeded { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FreshdeskError::Decode { status, .. } => Some(*status),
            other => other.context().and_then(|ctx| ctx.status),
        }
    }

    /// Returns the decoded service error payload, if any.
    pub fn payload(&self) -> Option<&ApiErrorPayload> {
        self.context().and_then(|ctx| ctx.payload.as_ref())
    }

    /// Returns true for a 404 response.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FreshdeskError::Api(ctx) if ctx.status == Some(404))
    }

    /// Returns true if the account's rate limit was hit.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FreshdeskError::RateLimitExceeded { .. })
    }

    /// Returns the retry hint carried by a rate limit error.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FreshdeskError::RateLimitExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Sanitizes an error message to remove any occurrence of the API key.
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the API key replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, api_key: &str) -> String {
        if api_key.is_empty() {
            return message.to_string();
        }
        message.replace(api_key, "[REDACTED]")
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn map(status: u16, headers: &HeaderMap, body: &str) -> FreshdeskError {
        FreshdeskError::from_status(Method::Get, "/tickets", status, headers, body.to_string())
    }

    #[test]
    fn test_missing_env_error() {
        let err = FreshdeskError::missing_env("FRESHDESK_API_KEY");
        assert!(err.to_string().contains("FRESHDESK_API_KEY"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_status_mapping() {
        let headers = HeaderMap::new();
        assert!(matches!(map(401, &headers, ""), FreshdeskError::Authentication(_)));
        assert!(matches!(map(403, &headers, ""), FreshdeskError::AccessDenied(_)));
        assert!(matches!(map(409, &headers, ""), FreshdeskError::ConflictingState(_)));
        assert!(matches!(
            map(415, &headers, ""),
            FreshdeskError::UnsupportedContentType(_)
        ));
        assert!(matches!(
            map(429, &headers, ""),
            FreshdeskError::RateLimitExceeded { .. }
        ));
        assert!(matches!(map(400, &headers, ""), FreshdeskError::Api(_)));
        assert!(matches!(map(500, &headers, ""), FreshdeskError::Api(_)));
    }

    #[test]
    fn test_not_found_is_generic_api_error() {
        let err = map(404, &HeaderMap::new(), "");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("42"));
        headers.insert("x-ratelimit-total", HeaderValue::from_static("200"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        let err = map(429, &headers, "");
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        match err {
            FreshdeskError::RateLimitExceeded { rate_limit, .. } => {
                assert_eq!(rate_limit.total, Some(200));
                assert_eq!(rate_limit.remaining, Some(0));
                assert_eq!(rate_limit.used_current_request, None);
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Fri, 31 Dec 2099 23:59:59 GMT"),
        );

        let info = RateLimitInfo::from_headers(&headers);
        assert!(info.retry_after.unwrap() > Duration::from_secs(3600));
        assert_eq!(
            info.retry_after_raw.as_deref(),
            Some("Fri, 31 Dec 2099 23:59:59 GMT")
        );

        let err = map(429, &headers, "");
        assert!(err.retry_after().is_some());
    }

    #[test]
    fn test_retry_after_past_date_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.retry_after, Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_unparsable_keeps_raw() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("soon"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.retry_after, None);
        assert_eq!(info.retry_after_raw.as_deref(), Some("soon"));
    }

    #[test]
    fn test_payload_is_decoded() {
        let body = r#"{"description":"Validation failed","errors":[{"field":"email","message":"It should be a valid email address","code":"invalid_value"}]}"#;
        let err = map(400, &HeaderMap::new(), body);

        let payload = err.payload().unwrap();
        assert_eq!(payload.description.as_deref(), Some("Validation failed"));
        assert_eq!(payload.codes(), vec!["invalid_value"]);

        let msg = err.to_string();
        assert!(msg.contains("GET /tickets"));
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("email: It should be a valid email address"));
    }

    #[test]
    fn test_payload_ignores_non_json() {
        let err = map(502, &HeaderMap::new(), "<html>Bad Gateway</html>");
        assert!(err.payload().is_none());
        assert_eq!(err.context().unwrap().raw_body, "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_auth_payload_summary() {
        let payload = ApiErrorPayload::parse(
            r#"{"code":"invalid_credentials","message":"You have to be logged in to perform this action."}"#,
        )
        .unwrap();
        assert_eq!(
            payload.summary().as_deref(),
            Some("You have to be logged in to perform this action.")
        );
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LEN * 2);
        let err = map(500, &HeaderMap::new(), &body);
        let raw = &err.context().unwrap().raw_body;
        assert!(raw.ends_with("...[truncated]"));
        assert!(raw.len() < body.len());
    }

    #[test]
    fn test_sanitize_message_removes_api_key() {
        let api_key = "super_secret_key_12345";
        let message = format!("Error connecting with key {} to server", api_key);
        let sanitized = FreshdeskError::sanitize_message(&message, api_key);
        assert!(!sanitized.contains(api_key));
        assert!(sanitized.contains("[REDACTED]"));
    }

    #[test]
    fn test_sanitize_message_empty_key() {
        let message = "Some error message";
        let sanitized = FreshdeskError::sanitize_message(message, "");
        assert_eq!(sanitized, message);
    }
}
