//! Serialization helpers for domain types.

pub mod duration;

pub use duration::duration_millis;
