//! Cache-aside coordination
//!
//! [`CacheCoordinator::get_or_compute`] serves a key from the store when a
//! live entry exists and otherwise runs the supplied producer, stores its
//! result and returns it. Failures are never cached.
//!
//! Concurrent misses for the same key are coalesced: callers queue on a
//! per-key async gate and re-check the store once they hold it, so a single
//! producer run serves everyone waiting. If that run fails, the next waiter
//! runs the producer itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace};

use super::stats::CacheStats;
use super::store::TtlCache;
use crate::resilience::{Clock, SystemClock};

type Gate = Arc<AsyncMutex<()>>;
type GateMap = Arc<Mutex<HashMap<String, Gate>>>;

/// Cache-aside front for a [`TtlCache`]
pub struct CacheCoordinator<V, C = SystemClock>
where
    V: Clone,
    C: Clock,
{
    cache: TtlCache<V, C>,
    in_flight: GateMap,
}

impl<V, C> CacheCoordinator<V, C>
where
    V: Clone,
    C: Clock + Clone,
{
    /// Wrap an existing store; clones of the store stay in sync.
    pub fn new(cache: TtlCache<V, C>) -> Self {
        Self { cache, in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn cache(&self) -> &TtlCache<V, C> {
        &self.cache
    }

    /// Return the cached value for `key` or compute, store and return it.
    ///
    /// `producer` runs at most once per call and only on a miss. Its error is
    /// returned untouched and nothing is written to the store.
    ///
    /// # Errors
    /// Propagates the producer's error.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: impl Into<Duration>,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(key) {
            trace!(key, "cache hit");
            return Ok(value);
        }

        let flight = Flight::join(&self.in_flight, key);
        let _permit = flight.gate.lock().await;

        // The miss is already counted; re-check without touching the counters.
        if let Some(value) = self.cache.peek(key) {
            debug!(key, "cache filled by concurrent producer");
            return Ok(value);
        }

        debug!(key, "cache miss, running producer");
        let value = producer().await?;
        self.cache.set(key, value.clone(), ttl.into());
        Ok(value)
    }

    /// Drop a single key
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.delete(key)
    }

    /// Drop every key starting with `prefix`, e.g. after an upstream mutation
    pub fn invalidate_by_pattern(&self, prefix: &str) -> usize {
        self.cache.invalidate_by_pattern(prefix)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Keys with a producer currently running or queued
    pub fn in_flight_keys(&self) -> Vec<String> {
        self.in_flight.lock().keys().cloned().collect()
    }
}

impl<V, C> Clone for CacheCoordinator<V, C>
where
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self { cache: self.cache.clone(), in_flight: Arc::clone(&self.in_flight) }
    }
}

/// Membership in the per-key gate; the last member out removes the gate.
struct Flight<'a> {
    map: &'a Mutex<HashMap<String, Gate>>,
    key: &'a str,
    gate: Gate,
}

impl<'a> Flight<'a> {
    fn join(map: &'a Mutex<HashMap<String, Gate>>, key: &'a str) -> Self {
        let gate = Arc::clone(map.lock().entry(key.to_owned()).or_default());
        Self { map, key, gate }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock();
        // One reference is held by the map, one by us.
        let last = map
            .get(self.key)
            .is_some_and(|gate| Arc::ptr_eq(gate, &self.gate) && Arc::strong_count(gate) == 2);
        if last {
            map.remove(self.key);
        }
    }
}
