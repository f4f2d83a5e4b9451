//! Configuration for the Freshdesk client.
//!
//! A [`Config`] is built either directly from an API key and a domain, or
//! from environment variables. Validation happens here so a bad credential
//! fails construction instead of the first request.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::FreshdeskError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default upper bound on pages followed by a single GET.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Configuration for connecting to Freshdesk.
///
/// The API key is never included in the `Debug` output.
#[derive(Clone)]
pub struct Config {
    /// Freshdesk subdomain, e.g. `acme` for `acme.freshdesk.com`.
    pub domain: String,

    /// API base URL, normally `https://{domain}.freshdesk.com/api/v2`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Maximum number of pages a GET follows before failing.
    pub max_pages: usize,

    /// API key used as the Basic auth username.
    /// This value must never be logged or included in error messages.
    api_key: String,
}

impl Config {
    /// Creates a configuration from an API key and a Freshdesk subdomain.
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` if either value is empty, if the API
    /// key has surrounding whitespace, or if the domain is not a single DNS
    /// label. The key is used verbatim.
    ///
    /// # Example
    ///
    /// ```
    /// use freshdesk::config::Config;
    ///
    /// let config = Config::new("abcdefghij1234567890", "acme").unwrap();
    /// assert_eq!(config.base_url, "https://acme.freshdesk.com/api/v2");
    /// ```
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Result<Self, FreshdeskError> {
        let api_key = api_key.into();
        let domain = domain.into().trim().to_string();

        Self::validate_api_key(&api_key)?;
        Self::validate_domain(&domain)?;

        Ok(Config {
            base_url: Self::base_url_for(&domain),
            domain,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_pages: DEFAULT_MAX_PAGES,
            api_key,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `FRESHDESK_API_KEY`: API key of the agent the client acts as
    /// - `FRESHDESK_DOMAIN`: Freshdesk subdomain
    ///
    /// # Optional Environment Variables
    ///
    /// - `FRESHDESK_BASE_URL`: overrides the derived base URL
    /// - `FRESHDESK_TIMEOUT_SECS`: per-request timeout (default 30)
    /// - `FRESHDESK_MAX_PAGES`: pagination bound (default 500)
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, FreshdeskError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from any variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FreshdeskError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| var(name).ok_or_else(|| FreshdeskError::missing_env(name));

        let mut config = Config::new(required("FRESHDESK_API_KEY")?, required("FRESHDESK_DOMAIN")?)?;

        if let Some(base_url) = var("FRESHDESK_BASE_URL") {
            config = config.with_base_url(base_url)?;
        }
        if let Some(secs) = var("FRESHDESK_TIMEOUT_SECS") {
            let secs = Self::parse_positive("FRESHDESK_TIMEOUT_SECS", &secs)?;
            config = config.with_timeout(Duration::from_secs(secs as u64));
        }
        if let Some(pages) = var("FRESHDESK_MAX_PAGES") {
            config = config.with_max_pages(Self::parse_positive("FRESHDESK_MAX_PAGES", &pages)?);
        }

        Ok(config)
    }

    /// Replaces the derived base URL, e.g. to go through a proxy.
    ///
    /// # Errors
    ///
    /// Returns `FreshdeskError::Config` unless the URL starts with
    /// `http://` or `https://`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, FreshdeskError> {
        self.base_url = Self::validate_base_url(url.into())?;
        Ok(self)
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the pagination bound.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Returns the API key.
    ///
    /// Only for building the auth header and sanitizing messages, never for logging.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Derives the API base URL for a subdomain.
    pub fn base_url_for(domain: &str) -> String {
        format!("https://{}.freshdesk.com/api/v2", domain)
    }

    fn parse_positive(name: &str, value: &str) -> Result<usize, FreshdeskError> {
        match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(FreshdeskError::invalid_config(format!(
                "{} must be a positive integer, got: {:?}",
                name, value
            ))),
        }
    }

    fn validate_api_key(api_key: &str) -> Result<(), FreshdeskError> {
        if api_key.trim().is_empty() {
            return Err(FreshdeskError::invalid_config("API key is empty"));
        }
        if api_key.trim() != api_key {
            return Err(FreshdeskError::invalid_config(
                "API key has leading or trailing whitespace",
            ));
        }
        Ok(())
    }

    /// Checks that the domain is a single DNS label.
    fn validate_domain(domain: &str) -> Result<(), FreshdeskError> {
        if domain.is_empty() {
            return Err(FreshdeskError::invalid_config("domain is empty"));
        }
        if domain.starts_with('-')
            || domain.ends_with('-')
            || !domain.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(FreshdeskError::invalid_config(format!(
                "domain must be a Freshdesk subdomain such as \"acme\", got: {:?}",
                domain.chars().take(50).collect::<String>()
            )));
        }
        Ok(())
    }

    /// Validates and normalizes a base URL override.
    fn validate_base_url(url: String) -> Result<String, FreshdeskError> {
        let url = url.trim().trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FreshdeskError::invalid_config(
                "base URL must start with http:// or https://",
            ));
        }

        Ok(url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_pages", &self.max_pages)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, FreshdeskError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_new_derives_base_url() {
        let config = Config::new("abc123def456", "acme").unwrap();
        assert_eq!(config.base_url, "https://acme.freshdesk.com/api/v2");
        assert_eq!(config.domain, "acme");
        assert_eq!(config.api_key(), "abc123def456");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_new_accepts_hyphenated_domain() {
        let config = Config::new("key", "acme-support-2").unwrap();
        assert_eq!(config.base_url, "https://acme-support-2.freshdesk.com/api/v2");
    }

    #[test]
    fn test_new_rejects_empty_api_key() {
        assert!(matches!(
            Config::new("", "acme"),
            Err(FreshdeskError::Config(_))
        ));
        assert!(matches!(
            Config::new("   ", "acme"),
            Err(FreshdeskError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_api_key_with_surrounding_whitespace() {
        assert!(matches!(
            Config::new(" abc123", "acme"),
            Err(FreshdeskError::Config(_))
        ));
        assert!(matches!(
            Config::new("abc123\n", "acme"),
            Err(FreshdeskError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_empty_domain() {
        assert!(matches!(
            Config::new("key", ""),
            Err(FreshdeskError::Config(_))
        ));
    }

    #[test]
    fn test_new_rejects_domain_that_alters_url() {
        assert!(Config::new("key", "acme.evil.com/x").is_err());
        assert!(Config::new("key", "acme@evil").is_err());
        assert!(Config::new("key", "-acme").is_err());
    }

    #[test]
    fn test_validate_base_url_removes_trailing_slash() {
        let result = Config::validate_base_url("http://127.0.0.1:8080/api/v2/".to_string()).unwrap();
        assert_eq!(result, "http://127.0.0.1:8080/api/v2");
    }

    #[test]
    fn test_validate_base_url_requires_scheme() {
        let result = Config::validate_base_url("example.com".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_max_pages_is_at_least_one() {
        let config = Config::new("key", "acme").unwrap().with_max_pages(0);
        assert_eq!(config.max_pages, 1);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config::new("super_secret_key", "acme").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super_secret_key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_lookup_required_only() {
        let config = from_vars(&[("FRESHDESK_API_KEY", "abc123"), ("FRESHDESK_DOMAIN", "acme")]).unwrap();
        assert_eq!(config.base_url, "https://acme.freshdesk.com/api/v2");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_from_lookup_optional_overrides() {
        let config = from_vars(&[
            ("FRESHDESK_API_KEY", "abc123"),
            ("FRESHDESK_DOMAIN", "acme"),
            ("FRESHDESK_BASE_URL", "http://127.0.0.1:9000/api/v2/"),
            ("FRESHDESK_TIMEOUT_SECS", "5"),
            ("FRESHDESK_MAX_PAGES", " 12 "),
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/api/v2");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_pages, 12);
    }

    #[test]
    fn test_from_lookup_blank_optionals_use_defaults() {
        let config = from_vars(&[
            ("FRESHDESK_API_KEY", "abc123"),
            ("FRESHDESK_DOMAIN", "acme"),
            ("FRESHDESK_TIMEOUT_SECS", ""),
            ("FRESHDESK_MAX_PAGES", "  "),
        ])
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let base = [("FRESHDESK_API_KEY", "abc123"), ("FRESHDESK_DOMAIN", "acme")];
        for (name, value) in [
            ("FRESHDESK_TIMEOUT_SECS", "0"),
            ("FRESHDESK_TIMEOUT_SECS", "ten"),
            ("FRESHDESK_MAX_PAGES", "-3"),
        ] {
            let mut vars = base.to_vec();
            vars.push((name, value));
            let err = from_vars(&vars).unwrap_err();
            assert!(matches!(err, FreshdeskError::Config(ref msg) if msg.contains(name)));
        }
    }

    #[test]
    fn test_from_lookup_rejects_bad_base_url() {
        let err = from_vars(&[
            ("FRESHDESK_API_KEY", "abc123"),
            ("FRESHDESK_DOMAIN", "acme"),
            ("FRESHDESK_BASE_URL", "ftp://acme"),
        ])
        .unwrap_err();
        assert!(matches!(err, FreshdeskError::Config(_)));
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = from_vars(&[("FRESHDESK_DOMAIN", "acme")]).unwrap_err();
        assert!(err.to_string().contains("FRESHDESK_API_KEY"));

        let err = from_vars(&[("FRESHDESK_API_KEY", "abc123"), ("FRESHDESK_DOMAIN", "")]).unwrap_err();
        assert!(err.to_string().contains("FRESHDESK_DOMAIN"));
    }
}
