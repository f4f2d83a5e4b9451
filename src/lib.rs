//! # Freshdesk
//!
//! Async client for the Freshdesk v2 REST API.
//!
//! Every call funnels through one dispatcher that handles authentication,
//! follows `link` headers across pages and maps failures onto a typed error
//! taxonomy, so callers never hand-write HTTP requests or pagination loops.
//!
//! ## Architecture
//!
//! - [`config`] - Credentials and client settings, from arguments or environment
//! - [`error`] - Error taxonomy keyed by HTTP status
//! - [`transport`] - The `Transport` trait and its reqwest implementation
//! - [`request`] - `Method` and `RequestSpec`
//! - [`pagination`] - `link` header parsing and correlation-id stamping
//! - [`client`] - The dispatcher, `FreshdeskClient`
//! - [`resources`] - Thin per-entity wrappers
//!
//! ## Configuration
//!
//! [`Config::from_env`](config::Config::from_env) reads:
//!
//! - `FRESHDESK_API_KEY`: API key of the agent the client acts as
//! - `FRESHDESK_DOMAIN`: Freshdesk subdomain (`acme` for `acme.freshdesk.com`)
//!
//! Optional:
//! - `FRESHDESK_BASE_URL`, `FRESHDESK_TIMEOUT_SECS`, `FRESHDESK_MAX_PAGES`
//! - `RUST_LOG`: Log level for the binary (e.g., `freshdesk=debug`)
//!
//! ## Security Considerations
//!
//! The API key is held in memory only. It is never logged, is redacted from
//! `Debug` output and is scrubbed from every response body captured into an
//! error.
//!
//! ## Example
//!
//! ```ignore
//! use freshdesk::{FreshdeskClient, FreshdeskError, RequestSpec};
//!
//! async fn example() -> Result<(), FreshdeskError> {
//!     let client = FreshdeskClient::new("your-api-key", "acme")?;
//!
//!     let open = client
//!         .request(RequestSpec::get("/tickets").with_query("filter", "new_and_my_open"))
//!         .await?;
//!     println!("{} open tickets", open.as_array().map_or(0, Vec::len));
//!
//!     match client.get("/tickets/999999").await {
//!         Err(e) if e.is_not_found() => println!("no such ticket"),
//!         Err(FreshdeskError::RateLimitExceeded { retry_after, .. }) => {
//!             println!("slow down, retry in {:?}", retry_after)
//!         }
//!         other => println!("{:?}", other?),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod request;
pub mod resources;
pub mod transport;

pub use client::FreshdeskClient;
pub use config::Config;
pub use error::FreshdeskError;
pub use request::{Method, RequestSpec};
