//! HTTP transport for the Tessie API.
//!
//! The [`Transport`] trait is the seam between the resilience layer and the
//! wire: the production implementation is [`HttpTransport`] (reqwest), and
//! tests substitute scripted implementations to drive the cache and retry
//! paths without sockets.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use std::time::Duration;

/// Error raised by a single transport attempt, before classification.
///
/// This type never crosses the crate boundary; the classifier converts it
/// into an [`crate::ApiError`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}")]
    Status {
        status: u16,
        body: String,
        /// Parsed `Retry-After` header, when present.
        retry_after: Option<Duration>,
        /// Request metadata for diagnostics. May contain credential-bearing
        /// headers; must pass through sanitization before being echoed.
        meta: serde_json::Value,
    },

    #[error("response shape not recognized: {0}")]
    Shape(String),
}

/// One JSON round-trip to the upstream service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, TransportError>;

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}
