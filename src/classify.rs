//! Error classification.
//!
//! Converts a raw [`TransportError`] into a normalized [`ApiError`]
//! descriptor: kind, retriability, remediation hint, and sanitized request
//! metadata. Pure aside from diagnostic logging, which itself never sees
//! credentials.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::error::{ApiError, ErrorKind};
use crate::transport::TransportError;

/// Keys whose values are stripped from echoed request metadata,
/// matched case-insensitively at every nesting level.
static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "auth",
        "token",
        "access_token",
        "refresh_token",
        "api_key",
        "apikey",
        "x-api-key",
        "secret",
        "client_secret",
        "password",
        "cookie",
        "set-cookie",
        "bearer",
    ]
    .into_iter()
    .collect()
});

const REDACTED: &str = "[redacted]";
const TRUNCATED: &str = "[truncated]";
/// serde_json values are acyclic, so a depth bound is the cycle guard.
const MAX_SANITIZE_DEPTH: usize = 16;
const MAX_BODY_SNIPPET: usize = 256;

/// Classify a transport failure for the given logical operation.
pub fn classify(err: &TransportError, context: &str) -> ApiError {
    let descriptor = match err {
        TransportError::Status {
            status,
            body,
            retry_after,
            meta,
        } => classify_status(*status, body, *retry_after, meta, context),
        TransportError::Http(e) if e.is_timeout() => ApiError::new(
            ErrorKind::Timeout,
            format!("{context} timed out: {e}"),
            context,
        ),
        TransportError::Http(e) if e.is_connect() => ApiError::new(
            ErrorKind::Network,
            format!("{context} could not connect: {e}"),
            context,
        ),
        TransportError::Http(e) if e.is_decode() => ApiError::new(
            ErrorKind::UnknownFormat,
            format!("{context} returned an undecodable body: {e}"),
            context,
        ),
        TransportError::Http(e) => ApiError::new(
            ErrorKind::Unknown,
            format!("{context} failed: {e}"),
            context,
        ),
        TransportError::Shape(msg) => ApiError::new(
            ErrorKind::UnknownFormat,
            format!("{context} returned an unrecognized shape: {msg}"),
            context,
        ),
    };

    warn!(
        kind = descriptor.kind.as_str(),
        http_status = descriptor.status,
        retriable = descriptor.retriable,
        context,
        "classified upstream failure"
    );

    descriptor
}

fn classify_status(
    status: u16,
    body: &str,
    retry_after: Option<std::time::Duration>,
    meta: &Value,
    context: &str,
) -> ApiError {
    let kind = match status {
        401 | 403 => ErrorKind::Authentication,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimit,
        408 => ErrorKind::Timeout,
        500 | 502 | 503 | 504 => ErrorKind::ServerError,
        _ => ErrorKind::GenericApi,
    };
    let retriable = match kind {
        ErrorKind::GenericApi => status >= 500,
        k => k.default_retriable(),
    };

    let snippet = body_snippet(body);
    let message = if snippet.is_empty() {
        format!("{context} failed with HTTP {status}")
    } else {
        format!("{context} failed with HTTP {status}: {snippet}")
    };

    ApiError::new(kind, message, context)
        .with_status(status)
        .with_retriable(retriable)
        .with_retry_after(retry_after)
        .with_details(sanitize_details(meta))
}

fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_BODY_SNIPPET {
        return trimmed.to_string();
    }
    let mut end = MAX_BODY_SNIPPET;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

/// Strip credential-bearing keys from request metadata before it is echoed
/// to callers, recursing through objects and arrays up to a fixed depth.
pub fn sanitize_details(value: &Value) -> Value {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &Value, depth: usize) -> Value {
    if depth >= MAX_SANITIZE_DEPTH {
        return Value::String(TRUNCATED.to_string());
    }
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                if SENSITIVE_KEYS.contains(key.to_ascii_lowercase().as_str()) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), sanitize_at(val, depth + 1));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| sanitize_at(v, depth + 1)).collect())
        }
        other => other.clone(),
    }
}
