//! Logging setup for binaries embedding the storefront core
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the process entry point via [`init_tracing`].

mod logging;

pub use logging::{init_tracing, LogFormat, DEFAULT_LOG_FILTER, ENV_LOG_FORMAT};
