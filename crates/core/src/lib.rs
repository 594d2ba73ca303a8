//! # Storefront Core
//!
//! Business logic layer: no HTTP, no environment access.
//!
//! This crate contains:
//! - Port interfaces (traits) for upstream data sources
//! - Services that put the shared TTL cache in front of those ports
//!
//! ## Architecture Principles
//! - Depends only on `storefront-common` and `storefront-domain`
//! - All I/O goes through traits implemented in `storefront-infra`

pub mod catalog;

pub use catalog::ports::CatalogApi;
pub use catalog::{cache_keys, CatalogService};
