//! Configuration loading
//!
//! Builds an [`ApiConfig`](storefront_domain::ApiConfig) from environment
//! variables or a config file.

pub mod loader;

// Re-export commonly used items
pub use loader::{config_from_lookup, load, load_from_env, load_from_file, probe_config_paths};
