//! Resilience primitives shared by the request orchestrator and the cache
//!
//! - **Clock**: time abstraction so expiry and backoff can be tested without
//!   real delays
//! - **Backoff**: exponential delay schedule between retry attempts, with
//!   optional proportional jitter
//!
//! The retry loop itself lives next to the HTTP transport in
//! `storefront-infra`, because the retry decision depends on how transport
//! failures are classified.

pub mod backoff;
pub mod clock;

pub use backoff::{Backoff, Jitter, MAX_BACKOFF_EXPONENT};
pub use clock::{Clock, MockClock, SystemClock};
