//! Retry engine.
//!
//! Wraps a single-attempt transport operation with classification-driven
//! exponential backoff. Backoff suspends only the calling task; nothing else
//! is blocked while a retry waits.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::error::{Error, ErrorKind, Result};
use crate::transport::TransportError;

/// Which failure kinds an invocation is willing to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Reads are idempotent: retry everything the classifier marks retriable.
    Read,
    /// Commands mutate vehicle state. Only failures where the request
    /// provably carried no effect are retried: throttling (429) and
    /// connection-establishment errors. Timeouts and 5xx are surfaced
    /// instead, because the upstream may already have applied the command.
    Command,
}

/// Configuration for the retry/backoff loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default 3).
    pub max_attempts: u32,
    /// First backoff delay; doubles on each further retry (default 500ms).
    pub base_delay: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reads()
    }
}

impl RetryPolicy {
    pub fn reads() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            mode: RetryMode::Read,
        }
    }

    pub fn commands() -> Self {
        Self {
            mode: RetryMode::Command,
            ..Self::reads()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Backoff for the retry following `attempt` (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    fn eligible(&self, kind: ErrorKind, retriable: bool) -> bool {
        match self.mode {
            RetryMode::Read => retriable,
            RetryMode::Command => matches!(kind, ErrorKind::RateLimit | ErrorKind::Network),
        }
    }
}

/// Run `op` until it succeeds, the failure is not retriable, or attempts run
/// out. The raw transport error never escapes: callers always receive the
/// classified descriptor.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, context: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, TransportError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(transport_err) => {
                let descriptor = classify(&transport_err, context);
                if !policy.eligible(descriptor.kind, descriptor.retriable)
                    || attempt >= policy.max_attempts
                {
                    warn!(
                        context,
                        attempt,
                        kind = descriptor.kind.as_str(),
                        "giving up"
                    );
                    return Err(Error::Api(descriptor));
                }

                let mut delay = policy.delay_after(attempt);
                // An upstream throttle hint can only lengthen the wait.
                if let Some(hint) = descriptor.retry_after {
                    if hint > delay {
                        delay = hint;
                    }
                }
                debug!(
                    context,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    kind = descriptor.kind.as_str(),
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
