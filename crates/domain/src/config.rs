//! API client configuration

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TIMEOUT_MS};
use crate::utils::duration_millis;
use crate::{Result, StorefrontError};

/// Connection settings for the upstream storefront API.
///
/// Only `base_url` is required; every other field falls back to the
/// documented defaults when absent from the config source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address every endpoint is appended to
    pub base_url: String,

    /// Per-attempt timeout
    #[serde(rename = "timeout_ms", default = "default_timeout", with = "duration_millis")]
    pub timeout: Duration,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff
    #[serde(
        rename = "retry_base_delay_ms",
        default = "default_retry_base_delay",
        with = "duration_millis"
    )]
    pub retry_base_delay: Duration,

    /// Headers sent with every request (per-call headers win)
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

fn default_timeout() -> Duration {
    Duration::from_millis(DEFAULT_TIMEOUT_MS)
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_base_delay() -> Duration {
    Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS)
}

impl ApiConfig {
    /// Configuration with defaults for everything but the base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            default_headers: BTreeMap::new(),
        }
    }

    /// Check the configuration before any request is issued.
    ///
    /// # Errors
    /// Returns `StorefrontError::Config` if the base address is not an
    /// absolute http(s) URL, the timeout is zero, or two default headers
    /// differ only in case (header names are case-insensitive on the wire).
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            StorefrontError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StorefrontError::Config(format!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(StorefrontError::Config("timeout must be greater than zero".into()));
        }

        if self.default_headers.keys().any(|name| name.trim().is_empty()) {
            return Err(StorefrontError::Config("default header names must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for name in self.default_headers.keys() {
            if !seen.insert(name.trim().to_ascii_lowercase()) {
                return Err(StorefrontError::Config(format!(
                    "default header '{name}' is configured more than once"
                )));
            }
        }

        Ok(())
    }
}
