//! Client construction.

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::cache::{CacheConfig, CacheStore, JitterSource, RandomJitter};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, Transport};

use super::config::{ClientConfig, TtlConfig};
use super::core::VehicleClient;

/// Builder for [`VehicleClient`].
///
/// ```rust,no_run
/// use tessie_client::VehicleClientBuilder;
///
/// # fn main() -> tessie_client::Result<()> {
/// let client = VehicleClientBuilder::new()
///     .with_token("tessie-api-token")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct VehicleClientBuilder {
    token: Option<String>,
    config: ClientConfig,
    jitter: Arc<dyn JitterSource>,
    transport: Option<Arc<dyn Transport>>,
}

impl VehicleClientBuilder {
    pub fn new() -> Self {
        Self {
            token: None,
            config: ClientConfig::default(),
            jitter: Arc::new(RandomJitter::default()),
            transport: None,
        }
    }

    /// Read the token from `TESSIE_API_KEY` and, if set, the base URL from
    /// `TESSIE_BASE_URL`.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        builder.token = std::env::var("TESSIE_API_KEY").ok();
        if let Ok(base_url) = std::env::var("TESSIE_BASE_URL") {
            builder.config.base_url = base_url;
        }
        builder
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn with_command_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.command_retry = retry;
        self
    }

    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn with_ttl_config(mut self, ttl: TtlConfig) -> Self {
        self.config.ttl = ttl;
        self
    }

    pub fn with_jitter_source(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Substitute the wire layer entirely. Intended for tests; when set, the
    /// token and base URL are unused.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<VehicleClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                Url::parse(&self.config.base_url).map_err(|e| {
                    Error::validation(format!("invalid base URL {:?}: {e}", self.config.base_url))
                })?;
                let token = self
                    .token
                    .ok_or_else(|| Error::validation("an API token is required"))?;
                Arc::new(
                    HttpTransport::new(self.config.base_url.clone(), token, self.config.timeout)
                        .map_err(|e| {
                            Error::validation(format!("failed to build HTTP client: {e}"))
                        })?,
                )
            }
        };

        let store = CacheStore::new(self.config.cache.clone(), self.jitter);
        Ok(VehicleClient::from_parts(transport, store, self.config))
    }
}

impl Default for VehicleClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
