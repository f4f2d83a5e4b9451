//! Helpers for following `link` headers across pages.
//!
//! Freshdesk list endpoints answer with at most one page and, when more
//! remain, a header of the form
//!
//! ```text
//! link: <https://acme.freshdesk.com/api/v2/tickets?page=2&per_page=30>; rel="next"
//! ```
//!
//! Its absence marks the last page. The relation may also arrive on its own
//! header line, so every `link` line of a response is scanned.

use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::error::FreshdeskError;

/// Name of the continuation header.
pub const LINK_HEADER: &str = "link";

/// Field stamped onto list items with the caller's correlation id.
pub const CORRELATION_FIELD: &str = "category_id";

/// Finds the `rel="next"` target across every `link` header line.
///
/// A line that is not visible ASCII cannot be parsed reliably and fails
/// with [`FreshdeskError::InvalidPageLink`] rather than ending the listing.
pub fn next_link_from_headers(headers: &HeaderMap) -> Result<Option<String>, FreshdeskError> {
    for value in headers.get_all(LINK_HEADER) {
        let text = value.to_str().map_err(|_| {
            FreshdeskError::invalid_page_link(
                String::from_utf8_lossy(value.as_bytes()),
                "link header is not visible ASCII",
            )
        })?;
        if let Some(link) = next_link(text)? {
            return Ok(Some(link));
        }
    }
    Ok(None)
}

/// Extracts the `rel="next"` target from a `link` header value.
///
/// Returns `Ok(None)` when the header advertises no next page, and an
/// error when it is too malformed to tell.
pub fn next_link(header: &str) -> Result<Option<String>, FreshdeskError> {
    let header = header.trim();
    if header.is_empty() {
        return Ok(None);
    }

    if !header.contains('<') {
        if !has_next_rel(header) {
            return Ok(None);
        }
        let stripped: String = header
            .replace("rel=\"next\"", "")
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | ';') && !c.is_whitespace())
            .collect();
        if stripped.is_empty() {
            return Err(FreshdeskError::invalid_page_link(header, "next link has no target"));
        }
        return Ok(Some(stripped));
    }

    let mut rest = header;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            return Err(FreshdeskError::invalid_page_link(header, "unterminated '<' in link header"));
        };
        let target = after[..end].trim();
        let tail = &after[end + 1..];
        let params = tail.find('<').map_or(tail, |i| &tail[..i]);
        if has_next_rel(params) {
            if target.is_empty() {
                return Err(FreshdeskError::invalid_page_link(header, "next link has no target"));
            }
            return Ok(Some(target.to_string()));
        }
        rest = tail;
    }
    Ok(None)
}

/// Checks link parameters such as `; rel="next",` for the `next` relation.
fn has_next_rel(params: &str) -> bool {
    params
        .split(';')
        .filter_map(|p| p.split_once('='))
        .any(|(key, value)| {
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_end_matches(',')
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        })
}

/// Resolves a next-page link against the base URL.
///
/// Relative links are joined under the base path, so `tickets?page=2`
/// lands next to `/api/v2` rather than replacing its last segment. The
/// result must share scheme, host and port with the base so credentials
/// are never sent elsewhere.
pub fn resolve_next(base_url: &str, link: &str) -> Result<Url, FreshdeskError> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
        .map_err(|e| FreshdeskError::invalid_config(format!("invalid base URL: {}", e)))?;
    let next = base
        .join(link)
        .map_err(|e| FreshdeskError::invalid_page_link(link, e.to_string()))?;

    if next.scheme() != base.scheme()
        || next.host_str() != base.host_str()
        || next.port_or_known_default() != base.port_or_known_default()
    {
        return Err(FreshdeskError::invalid_page_link(
            link,
            "points outside the configured Freshdesk host",
        ));
    }

    Ok(next)
}

/// Query pairs to re-send with a follow-up page.
///
/// The link already encodes the page cursor and usually the original
/// filters; only keys it does not carry are added back.
pub fn remaining_query(next: &Url, query: &[(String, String)]) -> Vec<(String, String)> {
    query
        .iter()
        .filter(|(key, _)| !next.query_pairs().any(|(k, _)| k == key.as_str()))
        .cloned()
        .collect()
}

/// Writes `category_id = id` into every object of a decoded result.
///
/// Arrays have each object element stamped; a lone object is stamped
/// itself. Anything else is returned untouched.
pub fn stamp_correlation_id(value: Value, id: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| stamp_correlation_id_item(item, id))
                .collect(),
        ),
        other => stamp_correlation_id_item(other, id),
    }
}

fn stamp_correlation_id_item(item: Value, id: &Value) -> Value {
    match item {
        Value::Object(mut fields) => {
            fields.insert(CORRELATION_FIELD.to_string(), id.clone());
            Value::Object(fields)
        }
        other => other,
    }
}
