//! Cache configuration and TTL presets
//!
//! Callers pick a [`CacheTtl`] per data-volatility class: inventory counts
//! change constantly and use `Short`, catalog listings rarely change and use
//! `Long`.

use std::time::Duration;

/// TTL presets for cache-aside reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTtl {
    /// 5 seconds
    Short,
    /// 30 seconds
    Medium,
    /// 5 minutes
    Long,
    /// 30 minutes
    VeryLong,
    /// Caller-chosen duration
    Custom(Duration),
}

impl CacheTtl {
    pub const fn as_duration(self) -> Duration {
        match self {
            CacheTtl::Short => Duration::from_secs(5),
            CacheTtl::Medium => Duration::from_secs(30),
            CacheTtl::Long => Duration::from_secs(5 * 60),
            CacheTtl::VeryLong => Duration::from_secs(30 * 60),
            CacheTtl::Custom(duration) => duration,
        }
    }
}

impl From<CacheTtl> for Duration {
    fn from(ttl: CacheTtl) -> Self {
        ttl.as_duration()
    }
}

/// Configuration for cache behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL used by [`TtlCache::insert`](super::TtlCache::insert)
    pub default_ttl: Duration,

    /// How often the background sweeper evicts expired entries
    pub sweep_interval: Duration,

    /// Whether to collect hit/miss/expiration counters
    pub track_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: CacheTtl::Medium.as_duration(),
            sweep_interval: Duration::from_secs(5 * 60),
            track_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }
}

/// Builder for CacheConfig with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn default_ttl(mut self, ttl: impl Into<Duration>) -> Self {
        self.config.default_ttl = ttl.into();
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
