//! # Storefront Domain
//!
//! Domain types shared by every storefront crate.
//!
//! This crate contains:
//! - The upstream failure taxonomy ([`ApiError`]) and the top-level
//!   [`StorefrontError`]
//! - API client configuration ([`ApiConfig`])
//! - Response payloads ([`Payload`]) and catalog records
//!
//! ## Architecture
//! - No dependencies on other storefront crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
