use std::io::IsTerminal;
use std::str::FromStr;

use storefront_domain::{Result, StorefrontError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Selects the output format (`plain` or `json`)
pub const ENV_LOG_FORMAT: &str = "STOREFRONT_LOG_FORMAT";

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines, colored when stdout is a terminal
    #[default]
    Plain,
    /// One JSON object per event, for log shippers
    Json,
}

impl LogFormat {
    /// Format from `STOREFRONT_LOG_FORMAT`, defaulting to plain.
    pub fn from_env() -> Self {
        std::env::var(ENV_LOG_FORMAT)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = StorefrontError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" | "pretty" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(StorefrontError::Config(format!("Unknown log format '{other}'"))),
        }
    }
}

/// Install the global console subscriber.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
///
/// # Errors
/// Returns `StorefrontError::Internal` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let layer = match format {
        LogFormat::Plain => fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| {
            StorefrontError::Internal(format!("failed to install tracing subscriber: {e}"))
        })?;

    tracing::debug!(?format, "tracing initialized");
    Ok(())
}
