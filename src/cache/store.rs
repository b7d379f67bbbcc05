//! Cache store with in-flight request coalescing.
//!
//! One `CacheStore` instance owns both the entry map and the in-flight map;
//! it is created with the client and torn down with it. All map mutations
//! happen under a single lock that is never held across an await, so no
//! task can observe a torn intermediate state.
//!
//! A key moves through `EMPTY → FETCHING → CACHED → (EXPIRED | EVICTED |
//! INVALIDATED) → EMPTY`. `FETCHING` is shared: every concurrent caller for
//! the same key awaits the same pending future, so at most one upstream call
//! per key is outstanding at any instant.

use futures::future::{BoxFuture, FutureExt, Shared};
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;

use super::key::CacheKey;

/// Source of the multiplicative TTL perturbation.
///
/// Injectable so tests can pin expiry deterministically; production uses
/// [`RandomJitter`].
pub trait JitterSource: Send + Sync {
    /// Factor applied to a TTL at store time.
    fn factor(&self) -> f64;
}

/// Uniform jitter in `[1 - spread, 1 + spread]`, spreading out expiry of
/// entries created together so they do not all refetch at once.
pub struct RandomJitter {
    spread: f64,
}

impl RandomJitter {
    pub fn new(spread: f64) -> Self {
        Self { spread }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new(0.10)
    }
}

impl JitterSource for RandomJitter {
    fn factor(&self) -> f64 {
        rand::thread_rng().gen_range(1.0 - self.spread..=1.0 + self.spread)
    }
}

/// Fixed jitter factor, for deterministic expiry in tests.
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn factor(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry count bound; exceeded entries are evicted least-recently-touched
    /// first.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 200 }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }
}

/// Counter snapshot; see [`CacheStore::stats`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that joined an already in-flight fetch instead of issuing
    /// their own.
    pub coalesced: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl AtomicStats {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

struct CacheEntry {
    value: Value,
    /// Fixed at store time; reads never extend it.
    expires_at: Instant,
    /// Refreshed on every read hit; orders eviction.
    last_touched: Instant,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value>>>;

#[derive(Default)]
struct Maps {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, SharedFetch>,
}

/// Keyed store of previously fetched results with jittered TTLs, a size
/// bound, and per-key single-flight fetching.
#[derive(Clone)]
pub struct CacheStore {
    maps: Arc<Mutex<Maps>>,
    config: CacheConfig,
    jitter: Arc<dyn JitterSource>,
    stats: Arc<AtomicStats>,
}

impl CacheStore {
    pub fn new(config: CacheConfig, jitter: Arc<dyn JitterSource>) -> Self {
        Self {
            maps: Arc::new(Mutex::new(Maps::default())),
            config,
            jitter,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// Return the cached value for `key`, join an in-flight fetch for it, or
    /// run `fetch` and cache its result for `ttl * jitter`.
    ///
    /// A failed fetch caches nothing and propagates the same error to every
    /// coalesced waiter; the next call for the key starts fresh.
    pub async fn fetch<F, Fut>(&self, key: CacheKey, ttl: Duration, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let shared = {
            let mut maps = self.maps.lock().unwrap();
            let now = Instant::now();

            if let Some(entry) = maps.entries.get_mut(&key) {
                if entry.expires_at > now {
                    entry.last_touched = now;
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(entry.value.clone());
                }
                // Lazy expiry: a stale entry behaves exactly like a miss.
                maps.entries.remove(&key);
            }

            if let Some(pending) = maps.in_flight.get(&key) {
                self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                pending.clone()
            } else {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                let driving = self.drive(key.clone(), ttl, fetch());
                maps.in_flight.insert(key, driving.clone());
                driving
            }
        };

        shared.await
    }

    /// Wrap `fut` so that settlement removes the in-flight entry and, on
    /// success, stores and prunes — all under one lock acquisition.
    fn drive(
        &self,
        key: CacheKey,
        ttl: Duration,
        fut: impl Future<Output = Result<Value>> + Send + 'static,
    ) -> SharedFetch {
        let maps = Arc::clone(&self.maps);
        let jitter = Arc::clone(&self.jitter);
        let stats = Arc::clone(&self.stats);
        let max_entries = self.config.max_entries;

        async move {
            let result = fut.await;
            let mut maps = maps.lock().unwrap();
            maps.in_flight.remove(&key);
            if let Ok(value) = &result {
                let now = Instant::now();
                let expires_at = now + ttl.mul_f64(jitter.factor());
                maps.entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        expires_at,
                        last_touched: now,
                    },
                );
                let evicted = prune(&mut maps.entries, max_entries, now);
                if evicted > 0 {
                    stats.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Purge every entry scoped to `vin` and the vehicle roster.
    ///
    /// Matching is exact on the key's VIN segment: `VIN123` never touches an
    /// entry for `VIN1234`. Best-effort forward invalidation — it guarantees
    /// the local cache stops serving pre-command data, not that the upstream
    /// has already applied the command.
    pub fn invalidate_vehicle(&self, vin: &str) -> usize {
        let mut maps = self.maps.lock().unwrap();
        let before = maps.entries.len();
        maps.entries
            .retain(|key, _| !(key.is_roster() || key.vin() == Some(vin)));
        let removed = before - maps.entries.len();
        if removed > 0 {
            self.stats
                .invalidations
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(vin, removed, "invalidated cached entries");
        }
        removed
    }

    /// Live (non-expired) entry count.
    pub fn len(&self) -> usize {
        let maps = self.maps.lock().unwrap();
        let now = Instant::now();
        maps.entries
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let maps = self.maps.lock().unwrap();
        maps.entries
            .get(key)
            .map(|e| e.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Drop a single entry, returning whether one existed.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.maps.lock().unwrap().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.maps.lock().unwrap().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

/// Drop expired entries, then evict least-recently-touched until the size
/// bound holds. Returns how many entries were evicted for size.
fn prune(entries: &mut HashMap<CacheKey, CacheEntry>, max_entries: usize, now: Instant) -> usize {
    entries.retain(|_, e| e.expires_at > now);
    let mut evicted = 0;
    while entries.len() > max_entries {
        let oldest = entries
            .iter()
            .min_by_key(|(_, e)| e.last_touched)
            .map(|(k, _)| k.clone());
        match oldest {
            Some(k) => {
                entries.remove(&k);
                evicted += 1;
            }
            None => break,
        }
    }
    evicted
}
