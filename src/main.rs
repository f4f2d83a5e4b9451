//! freshdesk - run a single Freshdesk API request from the command line
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `FRESHDESK_API_KEY`: API key of the agent to act as
//! - `FRESHDESK_DOMAIN`: Freshdesk subdomain
//!
//! # Usage
//!
//! ```bash
//! freshdesk GET /tickets
//! freshdesk POST /solutions/categories '{"name": "FAQ"}'
//! ```
//!
//! The decoded response is printed to stdout as pretty JSON. Logs go to
//! stderr.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use freshdesk::{config, FreshdeskClient, Method, RequestSpec};

const USAGE: &str = "usage: freshdesk <GET|POST|PUT|DELETE> <ENDPOINT> [JSON_BODY]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("freshdesk=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let spec = parse_args(std::env::args().skip(1))?;

    let config = config::Config::from_env().context("Failed to load configuration")?;
    tracing::debug!("Configuration loaded, base_url: {}", config.base_url);

    let client = FreshdeskClient::from_config(&config).context("Failed to create Freshdesk client")?;

    tracing::info!(method = %spec.method, endpoint = %spec.endpoint, "Sending request");
    let endpoint = spec.endpoint.clone();
    let result = client
        .request(spec)
        .await
        .with_context(|| format!("Request to {} failed", endpoint))?;

    let output = serde_json::to_string_pretty(&result).context("Failed to format response")?;
    println!("{}", output);

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<RequestSpec> {
    let Some(method) = args.next() else {
        bail!(USAGE);
    };
    let Some(endpoint) = args.next() else {
        bail!(USAGE);
    };

    let method: Method = method.parse().context(USAGE)?;
    let mut spec = RequestSpec::new(method, endpoint);

    if let Some(body) = args.next() {
        let body = serde_json::from_str(&body).context("JSON_BODY is not valid JSON")?;
        spec = spec.with_body(body);
    }
    if args.next().is_some() {
        bail!(USAGE);
    }

    Ok(spec)
}
