//! Time-bounded caching for upstream reads
//!
//! This module provides the pieces that keep redundant calls off the
//! upstream API:
//!
//! - [`TtlCache`]: thread-safe string-keyed store with per-entry TTL, lazy
//!   eviction on read and prefix invalidation
//! - [`CacheCoordinator`]: cache-aside `get_or_compute` with per-key
//!   coalescing of concurrent misses
//! - [`ExpirySweeper`]: background task that periodically evicts expired
//!   entries
//! - [`CacheTtl`]: presets for common data-volatility classes
//!
//! The cache is an explicit value: build one at startup and hand clones to
//! every consumer. Clones share storage.
//!
//! # Examples
//!
//! ## Cache-aside read
//! ```
//! use storefront_common::cache::{CacheConfig, CacheCoordinator, CacheTtl, TtlCache};
//!
//! # tokio_test::block_on(async {
//! let coordinator = CacheCoordinator::new(TtlCache::<String>::new(CacheConfig::default()));
//!
//! let listing = coordinator
//!     .get_or_compute("products:all", CacheTtl::Long, || async {
//!         Ok::<_, std::io::Error>("[...]".to_string())
//!     })
//!     .await?;
//! assert_eq!(listing, "[...]");
//!
//! // An upstream product update makes every derived listing stale.
//! coordinator.invalidate_by_pattern("products:");
//! # Ok::<_, std::io::Error>(())
//! # })
//! # .unwrap();
//! ```

mod config;
mod coordinator;
mod stats;
mod store;
mod sweeper;

// Re-export public API
pub use config::{CacheConfig, CacheConfigBuilder, CacheTtl};
pub use coordinator::CacheCoordinator;
pub use stats::CacheStats;
pub use store::TtlCache;
pub use sweeper::ExpirySweeper;
