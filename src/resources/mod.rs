//! Per-entity wrappers over the dispatcher.
//!
//! Resources perform no I/O of their own; each method is one call to
//! [`FreshdeskClient::request`](crate::client::FreshdeskClient::request).

pub mod solutions;

pub use solutions::Solutions;
