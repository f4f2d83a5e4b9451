//! Request dispatcher for the Freshdesk API.
//!
//! Every call goes through [`FreshdeskClient::request`], which builds the
//! absolute URL, performs the exchange through the configured [`Transport`],
//! follows `link` headers on GET requests and maps failures onto
//! [`FreshdeskError`].
//!
//! # Pagination
//!
//! A GET whose response carries a `link` header with `rel="next"` is
//! followed until a page arrives without one. Page elements are concatenated
//! in order. Each page is fetched exactly once; its headers and body come
//! from the same response. The number of pages is bounded by
//! [`Config::max_pages`].
//!
//! # Security
//!
//! The API key lives only in the transport and is scrubbed from every
//! captured response body.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::FreshdeskError;
use crate::pagination;
use crate::request::{Method, RequestSpec};
use crate::resources::Solutions;
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Endpoint used by [`FreshdeskClient::test_connection`].
const CONNECTION_TEST_ENDPOINT: &str = "/agents/me";

/// Client for the Freshdesk v2 API.
///
/// Cloning is cheap; clones share the transport.
///
/// # Example
///
/// ```ignore
/// let client = FreshdeskClient::new("your-api-key", "acme")?;
///
/// // Every ticket, across all pages
/// let tickets = client.get("/tickets").await?;
///
/// let created = client
///     .post("/tickets", json!({"subject": "VPN down", "email": "a@b.c", "priority": 1, "status": 2}))
///     .await?;
/// ```
#[derive(Clone)]
pub struct FreshdeskClient {
    /// Performs the HTTP exchanges.
    transport: Arc<dyn Transport>,

    /// API base URL (e.g., `https://acme.freshdesk.com/api/v2`).
    base_url: String,

    /// Upper bound on pages followed by one GET.
    max_pages: usize,

    /// API key, kept only for sanitizing captured bodies.
    /// SECURITY: Never log this value!
    api_key: String,
}

impl FreshdeskClient {
    /// Creates a client for `https://{domain}.freshdesk.com/api/v2`.
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` if either argument is empty or the
    /// domain is malformed. No network I/O happens here.
    pub fn new(api_key: &str, domain: &str) -> Result<Self, FreshdeskError> {
        Self::from_config(&Config::new(api_key, domain)?)
    }

    /// Creates a client backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` if the HTTP client fails to initialize.
    pub fn from_config(config: &Config) -> Result<Self, FreshdeskError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client that sends every exchange through `transport`.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            max_pages: config.max_pages,
            api_key: config.api_key().to_string(),
        }
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the solutions (knowledge base) resource.
    pub fn solutions(&self) -> Solutions<'_> {
        Solutions::new(self)
    }

    /// Performs a request and returns the decoded JSON.
    ///
    /// POST, PUT and DELETE issue exactly one exchange and return the body
    /// verbatim (`Value::Null` when empty). GET follows `link` headers and
    /// returns the concatenation of all pages, or the body unchanged when the
    /// first page is the only one. A correlation id is stamped as
    /// `category_id` onto every object of a GET result.
    ///
    /// # Errors
    ///
    /// Status-mapped variants for non-success responses,
    /// `FreshdeskError::Transport` when no response arrived,
    /// `FreshdeskError::Decode` for unparsable bodies and
    /// `FreshdeskError::PageLimitExceeded` when pagination does not end.
    pub async fn request(&self, spec: RequestSpec) -> Result<Value, FreshdeskError> {
        let url = self.url_for(&spec.endpoint);

        match spec.method {
            Method::Get => self.collect_pages(&spec, url).await,
            Method::Post | Method::Put | Method::Delete => {
                let response = self.exchange(&spec, url, spec.query.clone()).await?;
                self.decode(&spec, &response)
            }
        }
    }

    /// GET with full pagination.
    pub async fn get(&self, endpoint: &str) -> Result<Value, FreshdeskError> {
        self.request(RequestSpec::get(endpoint)).await
    }

    /// GET with query parameters and full pagination.
    pub async fn get_with_query<K, V>(
        &self,
        endpoint: &str,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Value, FreshdeskError>
    where
        K: Into<String>,
        V: std::fmt::Display,
    {
        let spec = query
            .into_iter()
            .fold(RequestSpec::get(endpoint), |spec, (k, v)| spec.with_query(k, v));
        self.request(spec).await
    }

    /// POST a JSON body.
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, FreshdeskError> {
        self.request(RequestSpec::post(endpoint).with_body(body)).await
    }

    /// PUT a JSON body.
    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, FreshdeskError> {
        self.request(RequestSpec::put(endpoint).with_body(body)).await
    }

    /// DELETE a resource.
    pub async fn delete(&self, endpoint: &str) -> Result<Value, FreshdeskError> {
        self.request(RequestSpec::delete(endpoint)).await
    }

    /// Tests connectivity and credentials by fetching the current agent.
    ///
    /// # Errors
    ///
    /// Returns whatever error the request produced, e.g.
    /// `FreshdeskError::Authentication` for a bad API key.
    pub async fn test_connection(&self) -> Result<(), FreshdeskError> {
        tracing::debug!("Testing connection to Freshdesk");
        self.get(CONNECTION_TEST_ENDPOINT).await?;
        tracing::info!("Connection test successful");
        Ok(())
    }

    /// Builds the absolute URL for an endpoint.
    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.is_empty() || endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Follows `link` headers and concatenates every page.
    async fn collect_pages(&self, spec: &RequestSpec, first_url: String) -> Result<Value, FreshdeskError> {
        let mut url = first_url;
        let mut query = spec.query.clone();
        let mut items: Vec<Value> = Vec::new();

        for page in 1..=self.max_pages {
            let response = self.exchange(spec, url, query).await?;
            let body = self.decode(spec, &response)?;

            let next = pagination::next_link_from_headers(&response.headers)?;

            let Some(link) = next else {
                tracing::debug!(endpoint = %spec.endpoint, pages = page, "Pagination complete");
                let result = if page == 1 {
                    body
                } else {
                    items.extend(self.page_items(spec, &response, body)?);
                    Value::Array(items)
                };
                return Ok(match &spec.correlation_id {
                    Some(id) => pagination::stamp_correlation_id(result, id),
                    None => result,
                });
            };

            items.extend(self.page_items(spec, &response, body)?);

            let next_url = pagination::resolve_next(&self.base_url, &link)?;
            query = pagination::remaining_query(&next_url, &spec.query);
            url = next_url.into();

            tracing::debug!(
                endpoint = %spec.endpoint,
                page,
                collected = items.len(),
                "Following next page link"
            );
        }

        tracing::warn!(
            endpoint = %spec.endpoint,
            max_pages = self.max_pages,
            "Page limit reached while paginating"
        );
        Err(FreshdeskError::PageLimitExceeded {
            endpoint: spec.endpoint.clone(),
            max_pages: self.max_pages,
        })
    }

    /// Elements of one page of a paginated collection.
    fn page_items(
        &self,
        spec: &RequestSpec,
        response: &TransportResponse,
        body: Value,
    ) -> Result<Vec<Value>, FreshdeskError> {
        match body {
            Value::Array(items) => Ok(items),
            other => Err(FreshdeskError::Decode {
                method: spec.method,
                endpoint: spec.endpoint.clone(),
                status: response.status,
                message: format!(
                    "expected a JSON array on a paginated response, got {}",
                    json_kind(&other)
                ),
            }),
        }
    }

    /// Performs one exchange and classifies non-success statuses.
    async fn exchange(
        &self,
        spec: &RequestSpec,
        url: String,
        query: Vec<(String, String)>,
    ) -> Result<TransportResponse, FreshdeskError> {
        tracing::debug!(
            method = %spec.method,
            endpoint = %spec.endpoint,
            "Making Freshdesk API request"
        );

        let request = TransportRequest {
            method: spec.method,
            url,
            body: spec.body.clone(),
            query,
        };

        let response = self.transport.send(request).await.map_err(|source| {
            tracing::debug!(
                method = %spec.method,
                endpoint = %spec.endpoint,
                timed_out = source.is_timeout(),
                "Freshdesk request failed without a response"
            );
            FreshdeskError::Transport {
                method: spec.method,
                endpoint: spec.endpoint.clone(),
                source,
            }
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.status == 429 {
            tracing::warn!(
                endpoint = %spec.endpoint,
                retry_after = response.header("retry-after").unwrap_or("-"),
                "Rate limited by Freshdesk"
            );
        } else {
            tracing::debug!(
                method = %spec.method,
                endpoint = %spec.endpoint,
                status = response.status,
                "Freshdesk returned an error status"
            );
        }

        let body = FreshdeskError::sanitize_message(&response.body_text(), &self.api_key);
        Err(FreshdeskError::from_status(
            spec.method,
            &spec.endpoint,
            response.status,
            &response.headers,
            body,
        ))
    }

    /// Decodes a successful body; an empty body is `Value::Null`.
    ///
    /// Bytes that are not valid UTF-8 are a decode error, never replaced.
    fn decode(&self, spec: &RequestSpec, response: &TransportResponse) -> Result<Value, FreshdeskError> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| FreshdeskError::Decode {
            method: spec.method,
            endpoint: spec.endpoint.clone(),
            status: response.status,
            message: e.to_string(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
