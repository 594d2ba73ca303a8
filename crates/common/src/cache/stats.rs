//! Cache statistics and metrics tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time view of a cache, for introspection only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries (expired entries not yet swept included)
    pub size: usize,

    /// Keys currently stored, sorted
    pub keys: Vec<String>,

    /// Reads that found a live entry
    pub hits: u64,

    /// Reads that found nothing or an expired entry
    pub misses: u64,

    /// Total number of writes
    pub inserts: u64,

    /// Entries removed because their TTL elapsed
    pub expirations: u64,

    /// Entries removed by delete or pattern invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total accesses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of access operations (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Lock-free counters shared between clones of a cache
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsCollector {
    enabled: bool,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    inserts: Arc<AtomicU64>,
    expirations: Arc<AtomicU64>,
    invalidations: Arc<AtomicU64>,
}

impl MetricsCollector {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled, ..Self::default() }
    }

    fn bump(&self, counter: &AtomicU64, by: u64) {
        if self.enabled {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.bump(&self.hits, 1);
    }

    pub(crate) fn record_miss(&self) {
        self.bump(&self.misses, 1);
    }

    pub(crate) fn record_insert(&self) {
        self.bump(&self.inserts, 1);
    }

    pub(crate) fn record_expirations(&self, count: usize) {
        self.bump(&self.expirations, count as u64);
    }

    pub(crate) fn record_invalidations(&self, count: usize) {
        self.bump(&self.invalidations, count as u64);
    }

    pub(crate) fn reset(&self) {
        for counter in
            [&self.hits, &self.misses, &self.inserts, &self.expirations, &self.invalidations]
        {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, keys: Vec<String>) -> CacheStats {
        CacheStats {
            size: keys.len(),
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
