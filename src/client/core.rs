//! Vehicle API client composition.
//!
//! Each read accessor follows the same path: validate and normalize the
//! arguments, build the canonical cache key, then hand the upstream call —
//! already wrapped in retry — to the cache store, which either serves a live
//! entry, joins an in-flight fetch, or runs the call. Commands skip the
//! cache entirely and invalidate the vehicle's entries after dispatch.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheKey, CacheStats, CacheStore};
use crate::decode::{decode, normalize, Shape};
use crate::error::Result;
use crate::retry::with_retry;
use crate::transport::Transport;
use crate::types::{
    BatteryState, Command, CommandOutcome, Drive, PathPoint, StateSnapshot, TimeRange, Vehicle,
    VehicleState,
};

use super::config::ClientConfig;
use super::validation::{clamp_limit, validate_range, validate_vin};

/// Typed, cached, retrying client for the Tessie vehicle API.
///
/// Cheap to clone; clones share the same cache and in-flight state.
#[derive(Clone)]
pub struct VehicleClient {
    transport: Arc<dyn Transport>,
    store: CacheStore,
    config: ClientConfig,
}

impl std::fmt::Debug for VehicleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VehicleClient {
    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        store: CacheStore,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    /// All vehicles on the account.
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>> {
        let value = self
            .fetch_value(
                CacheKey::vehicles(),
                self.config.ttl.vehicles,
                Shape::Collection,
                "vehicles",
                "/vehicles".to_string(),
                Vec::new(),
            )
            .await?;
        decode(value, "vehicles")
    }

    /// Current rollup state for one vehicle.
    pub async fn state(&self, vin: &str) -> Result<VehicleState> {
        let vin = validate_vin(vin)?;
        let value = self
            .fetch_value(
                CacheKey::state(vin),
                self.config.ttl.state,
                Shape::Object,
                "state",
                format!("/{vin}/state"),
                Vec::new(),
            )
            .await?;
        decode(value, "state")
    }

    /// Battery and charging status for one vehicle.
    pub async fn battery(&self, vin: &str) -> Result<BatteryState> {
        let vin = validate_vin(vin)?;
        let value = self
            .fetch_value(
                CacheKey::battery(vin),
                self.config.ttl.battery,
                Shape::Object,
                "battery",
                format!("/{vin}/battery"),
                Vec::new(),
            )
            .await?;
        decode(value, "battery")
    }

    /// Historical state samples within `range`.
    pub async fn historical_states(
        &self,
        vin: &str,
        range: TimeRange,
    ) -> Result<Vec<StateSnapshot>> {
        let vin = validate_vin(vin)?;
        validate_range(&range)?;
        let params = range.query_params();
        let value = self
            .fetch_value(
                CacheKey::states(vin, &params),
                self.config.ttl.states,
                Shape::Collection,
                "states",
                format!("/{vin}/states"),
                params,
            )
            .await?;
        decode(value, "states")
    }

    /// Most recent drives. `limit` is clamped into `[1, 100]`.
    pub async fn drives(&self, vin: &str, limit: i64) -> Result<Vec<Drive>> {
        let vin = validate_vin(vin)?;
        let limit = clamp_limit(limit);
        let params = vec![("limit", limit.to_string())];
        let value = self
            .fetch_value(
                CacheKey::drives(vin, &params),
                self.config.ttl.drives,
                Shape::Collection,
                "drives",
                format!("/{vin}/drives"),
                params,
            )
            .await?;
        decode(value, "drives")
    }

    /// Driving path points within `range`.
    pub async fn path(&self, vin: &str, range: TimeRange) -> Result<Vec<PathPoint>> {
        let vin = validate_vin(vin)?;
        validate_range(&range)?;
        let params = range.query_params();
        let value = self
            .fetch_value(
                CacheKey::path(vin, &params),
                self.config.ttl.path,
                Shape::Collection,
                "path",
                format!("/{vin}/path"),
                params,
            )
            .await?;
        decode(value, "path")
    }

    /// Dispatch a state-mutating command.
    ///
    /// Commands are never cached and use the conservative command retry
    /// policy. The vehicle's cached entries (and the roster) are purged
    /// after every dispatch, success or failure, since a failed dispatch
    /// may still have partially applied upstream.
    pub async fn send_command(&self, vin: &str, command: Command) -> Result<CommandOutcome> {
        let vin = validate_vin(vin)?;
        let path = format!("/{vin}/command/{}", command.endpoint());
        let transport = Arc::clone(&self.transport);
        let body = json!({});

        let result = with_retry(&self.config.command_retry, "command", || {
            let transport = Arc::clone(&transport);
            let path = path.clone();
            let body = body.clone();
            async move { transport.post_json(&path, &body).await }
        })
        .await;

        let removed = self.store.invalidate_vehicle(vin);
        debug!(vin, command = %command, removed, "purged cache after command dispatch");

        let value = normalize(result?, Shape::Object, "command")?;
        decode(value, "command")
    }

    /// Drop every cached entry scoped to `vin`, plus the roster.
    pub fn invalidate(&self, vin: &str) -> usize {
        self.store.invalidate_vehicle(vin)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn fetch_value(
        &self,
        key: CacheKey,
        ttl: Duration,
        shape: Shape,
        context: &'static str,
        path: String,
        query: Vec<(&'static str, String)>,
    ) -> Result<Value> {
        let transport = Arc::clone(&self.transport);
        let policy = self.config.retry.clone();
        self.store
            .fetch(key, ttl, move || async move {
                let value = with_retry(&policy, context, || {
                    let transport = Arc::clone(&transport);
                    let path = path.clone();
                    let query = query.clone();
                    async move { transport.get_json(&path, &query).await }
                })
                .await?;
                normalize(value, shape, context)
            })
            .await
    }
}
