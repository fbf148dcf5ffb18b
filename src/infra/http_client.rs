//! Shared reqwest client factory.
//!
//! Outbound processor calls must go through `build_client()` so every request
//! carries the same connect and total timeouts. A timeout surfaces to callers
//! as an upstream error; nothing is retried.

use reqwest::Client;
use std::time::Duration;

/// TCP handshake + TLS.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response time.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Panics if the client cannot be built (e.g., TLS misconfiguration). Only
/// called while assembling app state at startup.
pub fn build_client() -> Client {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}
