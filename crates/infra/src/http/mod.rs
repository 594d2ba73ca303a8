//! HTTP request orchestration against the storefront API

mod client;
mod request;
mod response;

pub use client::{ApiClient, ApiClientBuilder};
pub use request::{RequestOptions, StatusPredicate, IDEMPOTENCY_KEY_HEADER};
pub use reqwest::{Method, StatusCode};
