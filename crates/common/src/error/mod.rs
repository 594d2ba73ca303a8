//! Common error types and classification
//!
//! This module provides the shared vocabulary for classifying failures across
//! the storefront crates:
//!
//! 1. **`ErrorClassification` trait**: a standard interface for asking an
//!    error whether it is retryable and how severe it is.
//!
//! 2. **`ErrorSeverity` enum**: a unified severity scale used when choosing a
//!    log level for a failure.
//!
//! 3. **`CommonError`**: failures of the shared runtime pieces themselves
//!    (background task lifecycle, invalid configuration).
//!
//! Module-specific errors (such as the API failure taxonomy) implement
//! `ErrorClassification` in the crate that owns the conversion.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias for operations failing with [`CommonError`]
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by shared runtime infrastructure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid configuration or invalid lifecycle transition
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An operation did not finish in time
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// Internal invariant violated (task panicked, join failed, ...)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CommonError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a timeout error for a named operation
    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, dropped connections, and
    /// upstream server errors.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}
