//! # Storefront Infrastructure
//!
//! Implementations of the core ports and the process-level plumbing.
//!
//! This crate contains:
//! - The request orchestrator ([`http::ApiClient`]): timeouts, classified
//!   failures, exponential-backoff retries
//! - Configuration loading from the environment or a config file
//! - Tracing subscriber setup
//! - The HTTP catalog adapter
//!
//! ## Architecture
//! - Implements traits defined in `storefront-core`
//! - Contains all I/O: network, environment, filesystem

pub mod catalog;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use catalog::HttpCatalogApi;
pub use errors::InfraError;
pub use http::{ApiClient, ApiClientBuilder, RequestOptions};
pub use observability::{init_tracing, LogFormat};
