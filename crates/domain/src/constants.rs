//! Domain constants
//!
//! Defaults and environment variable names for the API client.

// Environment variables
pub const ENV_API_BASE_URL: &str = "STOREFRONT_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "STOREFRONT_API_TIMEOUT_MS";
pub const ENV_API_MAX_RETRIES: &str = "STOREFRONT_API_MAX_RETRIES";
pub const ENV_API_RETRY_DELAY_MS: &str = "STOREFRONT_API_RETRY_DELAY_MS";

// Request defaults
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

// Cache key namespaces
pub const PRODUCTS_KEY_PREFIX: &str = "products:";
