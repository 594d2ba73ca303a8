//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Load `.env` from the working directory if present
//! 2. Read environment variables; `STOREFRONT_API_BASE_URL` is required
//! 3. If the base URL variable is absent, fall back to a config file
//! 4. Probe standard paths for the file; JSON and TOML are supported
//!
//! A base URL that is present but invalid is an error; it never falls back.
//!
//! ## Environment Variables
//! - `STOREFRONT_API_BASE_URL`: base address every endpoint is appended to
//! - `STOREFRONT_API_TIMEOUT_MS`: per-attempt timeout in milliseconds
//! - `STOREFRONT_API_MAX_RETRIES`: retries after the first attempt
//! - `STOREFRONT_API_RETRY_DELAY_MS`: backoff base delay in milliseconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./storefront.json` or `./storefront.toml`
//! 2. `./config.json` or `./config.toml`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use storefront_domain::constants::{
    ENV_API_BASE_URL, ENV_API_MAX_RETRIES, ENV_API_RETRY_DELAY_MS, ENV_API_TIMEOUT_MS,
};
use storefront_domain::{ApiConfig, Result, StorefrontError};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["storefront.json", "storefront.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StorefrontError::Config` if the environment holds an invalid
/// value, or if the base URL is not set and no valid config file is found.
pub fn load() -> Result<ApiConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    if std::env::var_os(ENV_API_BASE_URL).is_none() {
        tracing::debug!(variable = ENV_API_BASE_URL, "Base URL not set, trying config file");
        return load_from_file(None);
    }

    let config = load_from_env()?;
    tracing::info!(base_url = %config.base_url, "Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `StorefrontError::Config` if the base URL is missing or any value
/// is invalid.
pub fn load_from_env() -> Result<ApiConfig> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from a variable lookup
///
/// `lookup` returns the value of a variable, or `None` when unset.
///
/// # Errors
/// Returns `StorefrontError::Config` if the base URL is missing or any value
/// is invalid.
pub fn config_from_lookup<F>(lookup: F) -> Result<ApiConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = lookup(ENV_API_BASE_URL)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            StorefrontError::Config(format!(
                "Missing required environment variable: {ENV_API_BASE_URL}"
            ))
        })?;

    let mut config = ApiConfig::new(base_url);

    if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_API_TIMEOUT_MS)? {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(retries) = parse_var::<u32, _>(&lookup, ENV_API_MAX_RETRIES)? {
        config.max_retries = retries;
    }
    if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_API_RETRY_DELAY_MS)? {
        config.retry_base_delay = Duration::from_millis(ms);
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `StorefrontError::Config` if the file is missing, unreadable,
/// malformed, or describes an invalid configuration.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ApiConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StorefrontError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StorefrontError::Config(format!(
                "{ENV_API_BASE_URL} is not set and no config file was found"
            ))
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StorefrontError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ApiConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StorefrontError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StorefrontError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(StorefrontError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file
///
/// Returns the first file that exists, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| StorefrontError::Config(format!("Invalid value for {key} ('{raw}'): {e}")))
}
