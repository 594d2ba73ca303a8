//! Error types used throughout the storefront core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure of a single upstream request.
///
/// Exactly one kind is reported per failed attempt. The request orchestrator
/// uses the kind to decide whether another attempt is worthwhile.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// The upstream answered with a status the caller does not accept.
    #[error("API error {status}: {message}")]
    Protocol { status: u16, message: String, code: Option<String>, retryable: bool },

    /// No answer: the connection could not be established or was dropped.
    #[error("Network error: {message}")]
    Network { message: String },

    /// No answer within the attempt's deadline.
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The request could not be built; nothing was sent.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    /// Build a protocol failure, retryable iff the status is a server error.
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol { status, message: message.into(), code: None, retryable: status >= 500 }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn timeout(after_ms: u64) -> Self {
        Self::Timeout { after_ms }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Attach an upstream error code to a protocol failure.
    #[must_use]
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        if let Self::Protocol { code, .. } = &mut self {
            *code = Some(new_code.into());
        }
        self
    }

    /// Override the retry classification of a protocol failure.
    #[must_use]
    pub fn with_retryable(mut self, value: bool) -> Self {
        if let Self::Protocol { retryable, .. } = &mut self {
            *retryable = value;
        }
        self
    }

    /// HTTP status for protocol failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Protocol { retryable, .. } => *retryable,
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::InvalidRequest { .. } => false,
        }
    }

    /// Whether the retry loop must give up immediately.
    ///
    /// Only client errors (400-499) that were not marked retryable, and
    /// requests that never left the process, halt the loop. Everything else
    /// is retried until the attempt budget runs out.
    pub fn halts_retry(&self) -> bool {
        match self {
            Self::Protocol { status, retryable, .. } => (400..500).contains(status) && !retryable,
            Self::InvalidRequest { .. } => true,
            Self::Network { .. } | Self::Timeout { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Main error type for the storefront core
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorefrontError {
    /// The upstream failure, if this error came from the API.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;
