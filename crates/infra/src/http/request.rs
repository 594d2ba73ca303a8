//! Per-call request descriptor

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Header carrying a caller-chosen idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Decides whether a response status counts as success.
pub type StatusPredicate = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Method, headers, body and overrides for one logical request.
///
/// Unset overrides fall back to the client's configured defaults. Per-call
/// headers replace default headers of the same name.
#[derive(Clone)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) body_error: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_retries: Option<u32>,
    pub(crate) retry_base_delay: Option<Duration>,
    pub(crate) accept: Option<StatusPredicate>,
    pub(crate) retryable_statuses: Vec<StatusCode>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
            body_error: None,
            timeout: None,
            max_retries: None,
            retry_base_delay: None,
            accept: None,
            retryable_statuses: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send `key` in the `Idempotency-Key` header so a retried write can be
    /// deduplicated upstream.
    pub fn idempotency_key(self, key: impl Into<String>) -> Self {
        self.header(IDEMPOTENCY_KEY_HEADER, key)
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// A serialization failure is reported by the request as
    /// `ApiError::InvalidRequest` before anything is sent.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => {
                self.body = Some(value);
                self.body_error = None;
            }
            Err(e) => {
                self.body = None;
                self.body_error = Some(format!("failed to serialize request body: {e}"));
            }
        }
        self
    }

    /// Per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retries after the first attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Single attempt only, e.g. for non-idempotent writes
    pub fn no_retry(self) -> Self {
        self.max_retries(0)
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Replace the default "2xx is success" rule.
    pub fn accept_status<F>(mut self, predicate: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.accept = Some(Arc::new(predicate));
        self
    }

    /// Treat a rejected `status` as transient, e.g. `429 Too Many Requests`.
    pub fn retry_on_status(mut self, status: StatusCode) -> Self {
        if !self.retryable_statuses.contains(&status) {
            self.retryable_statuses.push(status);
        }
        self
    }

    pub(crate) fn accepts(&self, status: StatusCode) -> bool {
        match &self.accept {
            Some(predicate) => predicate(status),
            None => status.is_success(),
        }
    }

    pub(crate) fn is_marked_retryable(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("custom_accept", &self.accept.is_some())
            .field("retryable_statuses", &self.retryable_statuses)
            .finish()
    }
}
