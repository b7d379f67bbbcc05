use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Normalized category for an upstream or local failure.
///
/// Every error surfaced by this crate carries exactly one kind; callers can
/// branch on it without inspecting transport internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401/403: the token is missing, expired, or lacks access.
    Authentication,
    /// 404: the VIN (or resource) does not exist for this account.
    NotFound,
    /// 429: upstream throttling.
    RateLimit,
    /// 500/502/503/504: upstream failure.
    ServerError,
    /// Request or connection timed out (408 or client-side timeout).
    Timeout,
    /// DNS resolution or connection establishment failed.
    Network,
    /// The response body was not a shape this client recognizes.
    UnknownFormat,
    /// Arguments were rejected before any network call.
    Validation,
    /// Anything that carried no usable signal.
    Unknown,
    /// An HTTP status outside the mapped set.
    GenericApi,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::UnknownFormat => "unknown_format",
            ErrorKind::Validation => "validation",
            ErrorKind::Unknown => "unknown",
            ErrorKind::GenericApi => "api_error",
        }
    }

    /// Whether failures of this kind are transient enough to retry.
    ///
    /// `GenericApi` is status-dependent and resolved by the classifier.
    pub fn default_retriable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimit | ErrorKind::ServerError | ErrorKind::Timeout | ErrorKind::Network
        )
    }

    /// Short remediation hint for the calling layer.
    pub fn suggestion(self) -> &'static str {
        match self {
            ErrorKind::Authentication => {
                "check that the Tessie API token is valid and has access to this vehicle"
            }
            ErrorKind::NotFound => "verify the VIN and that the vehicle is linked to this account",
            ErrorKind::RateLimit => "back off and retry after the throttle window",
            ErrorKind::ServerError => "the upstream service is degraded; retry shortly",
            ErrorKind::Timeout => "the vehicle or service is slow to respond; retry shortly",
            ErrorKind::Network => "check connectivity and DNS resolution",
            ErrorKind::UnknownFormat => "the upstream response shape changed; update the client",
            ErrorKind::Validation => "fix the request arguments",
            ErrorKind::Unknown => "inspect the error details",
            ErrorKind::GenericApi => "inspect the response status and body",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified description of a failed upstream call.
///
/// Produced fresh for every failure by [`crate::classify::classify`]; never
/// cached. `details` holds sanitized request metadata only — credentials are
/// stripped before the descriptor leaves the classifier.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub retriable: bool,
    pub status: Option<u16>,
    /// Upstream throttle hint, when a 429 carried one.
    pub retry_after: Option<Duration>,
    pub suggestion: &'static str,
    pub details: serde_json::Value,
    /// Logical operation that was being attempted ("state", "drives", ...).
    pub context: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retriable: kind.default_retriable(),
            status: None,
            retry_after: None,
            suggestion: kind.suggestion(),
            details: serde_json::Value::Null,
            context: context.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_retriable(mut self, retriable: bool) -> Self {
        self.retriable = retriable;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{}: HTTP {} ({}): {}",
                self.context, status, self.kind, self.message
            ),
            None => write!(f, "{}: ({}): {}", self.context, self.kind, self.message),
        }
    }
}

/// Unified error type for the client.
///
/// Raw transport errors never appear here; everything upstream-related is
/// classified into an [`ApiError`] first.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{0}")]
    Api(ApiError),

    #[error("validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api(e) => e.kind,
            Error::Validation { .. } => ErrorKind::Validation,
        }
    }

    pub fn retriable(&self) -> bool {
        match self {
            Error::Api(e) => e.retriable,
            Error::Validation { .. } => false,
        }
    }

    /// The classified descriptor, when this is an upstream failure.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            Error::Validation { .. } => None,
        }
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_default_retriability() {
        assert!(ErrorKind::RateLimit.default_retriable());
        assert!(ErrorKind::ServerError.default_retriable());
        assert!(ErrorKind::Timeout.default_retriable());
        assert!(ErrorKind::Network.default_retriable());
        assert!(!ErrorKind::Authentication.default_retriable());
        assert!(!ErrorKind::NotFound.default_retriable());
        assert!(!ErrorKind::UnknownFormat.default_retriable());
        assert!(!ErrorKind::Unknown.default_retriable());
        assert!(!ErrorKind::Validation.default_retriable());
    }

    #[test]
    fn every_kind_has_a_suggestion() {
        for kind in [
            ErrorKind::Authentication,
            ErrorKind::NotFound,
            ErrorKind::RateLimit,
            ErrorKind::ServerError,
            ErrorKind::Timeout,
            ErrorKind::Network,
            ErrorKind::UnknownFormat,
            ErrorKind::Validation,
            ErrorKind::Unknown,
            ErrorKind::GenericApi,
        ] {
            assert!(!kind.suggestion().is_empty(), "{kind} missing suggestion");
        }
    }

    #[test]
    fn display_includes_status_and_kind() {
        let err = ApiError::new(ErrorKind::ServerError, "boom", "state").with_status(503);
        let rendered = err.to_string();
        assert!(rendered.contains("503"));
        assert!(rendered.contains("server_error"));
        assert!(rendered.contains("state"));
    }
}
