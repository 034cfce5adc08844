//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;
use rp_core::Error;

pub const USER_AGENT: &str = concat!("research-posts/", env!("CARGO_PKG_VERSION"));

/// Build a client with the request-level timeout applied to every call.
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Convert a reqwest failure into the workspace error type.
///
/// The URL is dropped first: query strings may carry an API key.
pub fn transport_error(err: reqwest::Error) -> Error {
    let is_timeout = err.is_timeout();
    Error::from_transport(&err.without_url(), is_timeout)
}
