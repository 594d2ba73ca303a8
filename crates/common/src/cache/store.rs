//! Time-bounded key/value store
//!
//! Every entry carries its own expiry, stamped at write time from the
//! configured [`Clock`]. Expired entries are evicted lazily when a read finds
//! them and in bulk by [`TtlCache::clear_expired`], which the background
//! sweeper calls on a fixed interval so memory stays bounded even for keys
//! that are never read again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::config::CacheConfig;
use super::stats::{CacheStats, MetricsCollector};
use crate::resilience::{Clock, SystemClock};

/// Stored value with its validity window
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    /// `None` when `created_at + ttl` is not representable
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self { value, created_at: now, expires_at: now.checked_add(ttl) }
    }

    /// An entry is valid iff `now < expires_at`
    fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Thread-safe string-keyed cache with per-entry TTL
///
/// Cloning is cheap and clones share the same storage, so one instance can be
/// built at startup and handed to every consumer.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use storefront_common::cache::{CacheConfig, TtlCache};
///
/// let cache: TtlCache<String> = TtlCache::new(CacheConfig::default());
/// cache.set("products:all", "[...]".to_string(), Duration::from_secs(300));
/// assert_eq!(cache.get("products:all"), Some("[...]".to_string()));
/// ```
pub struct TtlCache<V, C = SystemClock>
where
    V: Clone,
    C: Clock,
{
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<V> TtlCache<V, SystemClock>
where
    V: Clone,
{
    /// Create a new cache using the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<V> Default for TtlCache<V, SystemClock>
where
    V: Clone,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V, C> TtlCache<V, C>
where
    V: Clone,
    C: Clock + Clone,
{
    /// Create a new cache with a custom clock (useful for testing)
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        let metrics = MetricsCollector::new(config.track_metrics);
        Self { entries: Arc::new(RwLock::new(HashMap::new())), config, metrics, clock }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a live value
    ///
    /// Returns `None` if the key is missing or its entry has expired. An
    /// expired entry is removed on the spot.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_valid_at(now) => {
                    self.metrics.record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.metrics.record_miss();
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, a writer may have refreshed it.
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_valid_at(now) => {
                self.metrics.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.metrics.record_expirations(1);
                self.metrics.record_miss();
                None
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Store a value for `ttl`, replacing any existing entry
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.write().insert(key.into(), entry);
        self.metrics.record_insert();
    }

    /// Store a value with the configured default TTL
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.config.default_ttl);
    }

    /// Remove one entry, returning whether it existed
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.metrics.record_invalidations(1);
        }
        removed
    }

    /// Remove every entry and reset the counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.metrics.reset();
    }

    /// Remove every entry whose key starts with `prefix`
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_by_pattern(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            self.metrics.record_invalidations(removed);
        }
        debug!(prefix, removed, "invalidated cache entries by prefix");
        removed
    }

    /// Evict every expired entry
    ///
    /// Returns the number of entries removed.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        let removed = before - entries.len();
        drop(entries);

        self.metrics.record_expirations(removed);
        removed
    }

    /// Whether a live entry exists, without touching the counters
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries.read().get(key).is_some_and(|entry| entry.is_valid_at(now))
    }

    /// Live value without recording a hit or miss
    pub(crate) fn peek(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        self.entries.read().get(key).filter(|entry| entry.is_valid_at(now)).map(|e| e.value.clone())
    }

    /// Age of a live entry
    pub fn age(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| now.saturating_duration_since(entry.created_at))
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size, keys and counters; does not evict anything
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort_unstable();
        self.metrics.snapshot(keys)
    }
}

impl<V, C> Clone for TtlCache<V, C>
where
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::resilience::MockClock;

    fn mock_cache() -> (TtlCache<i32, MockClock>, MockClock) {
        let clock = MockClock::new();
        (TtlCache::with_clock(CacheConfig::default(), clock.clone()), clock)
    }

    #[test]
    fn get_after_set_returns_value() {
        let (cache, _) = mock_cache();
        cache.set("k", 7, Duration::from_millis(1));
        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn missing_key_is_absent() {
        let (cache, _) = mock_cache();
        assert_eq!(cache.get("nope"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn set_overwrites_and_restamps() {
        let (cache, clock) = mock_cache();
        cache.set("k", 1, Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));
        cache.set("k", 2, Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.age("k"), Some(Duration::from_secs(8)));
    }

    #[test]
    fn expires_exactly_at_deadline() {
        let (cache, clock) = mock_cache();
        cache.set("k", 1, Duration::from_secs(5));

        clock.advance(Duration::from_millis(4999));
        assert_eq!(cache.get("k"), Some(1));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("k"), None);
        // Lazy eviction removed the entry on read.
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn zero_ttl_is_never_readable() {
        let (cache, _) = mock_cache();
        cache.set("k", 1, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn insert_uses_default_ttl() {
        let clock = MockClock::new();
        let config = CacheConfig::builder().default_ttl(Duration::from_secs(2)).build();
        let cache: TtlCache<i32, MockClock> = TtlCache::with_clock(config, clock.clone());

        cache.insert("k", 1);
        clock.advance(Duration::from_secs(2));
        assert!(!cache.contains_key("k"));
    }

    #[test]
    fn delete_and_clear() {
        let (cache, _) = mock_cache();
        cache.set("a", 1, Duration::from_secs(60));
        cache.set("b", 2, Duration::from_secs(60));

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().inserts, 0);
    }

    #[test]
    fn clear_expired_sweeps_only_stale_entries() {
        let (cache, clock) = mock_cache();
        cache.set("short", 1, Duration::from_secs(5));
        cache.set("long", 2, Duration::from_secs(60));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.clear_expired(), 1);
        assert_eq!(cache.stats().keys, vec!["long".to_string()]);
    }

    #[test]
    fn invalidate_by_pattern_removes_prefixed_keys() {
        let (cache, _) = mock_cache();
        cache.set("products:all", 1, Duration::from_secs(60));
        cache.set("products:inStock", 2, Duration::from_secs(60));
        cache.set("orders:1", 3, Duration::from_secs(60));

        assert_eq!(cache.invalidate_by_pattern("products:"), 2);

        let stats = cache.stats();
        assert_eq!(stats.keys, vec!["orders:1".to_string()]);
        assert_eq!(stats.invalidations, 2);
    }

    #[test]
    fn stats_has_no_side_effects() {
        let (cache, clock) = mock_cache();
        cache.set("k", 1, Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[test]
    fn clones_share_storage_across_threads() {
        let cache: TtlCache<usize> = TtlCache::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || cache.set(format!("key-{i}"), i, Duration::from_secs(60)))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8);
        assert_eq!(cache.get("key-3"), Some(3));
    }
}
