use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_common::error::{ErrorClassification, ErrorSeverity};
use storefront_common::resilience::Backoff;
use storefront_domain::{ApiConfig, ApiError, Payload, Result, StorefrontError};
use tracing::{debug, error, instrument, warn};

use super::request::RequestOptions;
use super::response::{protocol_failure, read_payload};
use crate::config;
use crate::errors::{InfraError, IntoApiError};

/// API client with per-attempt timeouts, classified failures and
/// exponential-backoff retries.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
    default_headers: HeaderMap,
    backoff: Backoff,
}

/// Everything an attempt needs once per-call overrides are resolved.
struct AttemptPlan {
    headers: HeaderMap,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl ApiClient {
    /// Start building a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(ApiConfig::new(base_url))
    }

    /// Build a client from loaded configuration.
    ///
    /// # Errors
    /// Returns `StorefrontError::Config` if the configuration is invalid.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        ApiClientBuilder::new(config.clone()).build()
    }

    /// Build a client from the environment (and `.env`), falling back to a
    /// config file when `STOREFRONT_API_BASE_URL` is not set.
    ///
    /// # Errors
    /// Returns `StorefrontError::Config` if no valid configuration is found.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&config::load()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Absolute URL for `endpoint`, with exactly one `/` after the base.
    pub fn url_for(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Issue a request, retrying transient failures.
    ///
    /// Attempts run strictly one after another, each bounded by the
    /// per-attempt timeout. Client errors (4xx) not marked retryable stop
    /// immediately; every other failure is retried up to `max_retries` times
    /// with `base × 2^attempt` between attempts. The last failure is returned
    /// once the budget is spent.
    ///
    /// # Errors
    /// Returns the classified [`ApiError`] of the final attempt.
    #[instrument(skip(self, options), fields(method = %options.method, endpoint = %endpoint))]
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> std::result::Result<Payload, ApiError> {
        let url = self.url_for(endpoint);
        let plan = self.plan(&options)?;

        let mut attempt: u32 = 0;
        loop {
            debug!(attempt = attempt + 1, method = %options.method, %url, "sending API request");

            let failure = match self.attempt(&url, &options, &plan).await {
                Ok(payload) => return Ok(payload),
                Err(failure) => failure,
            };

            if failure.halts_retry() {
                log_terminal_failure(&url, attempt + 1, &failure);
                return Err(failure);
            }

            if attempt >= plan.max_retries {
                warn!(
                    attempts = attempt + 1,
                    method = %options.method,
                    %url,
                    error = %failure,
                    "API request failed after exhausting retries"
                );
                return Err(failure);
            }

            let delay = self.backoff.delay(attempt, plan.retry_base_delay);
            debug!(
                attempt = attempt + 1,
                delay_ms = millis(delay),
                error = %failure,
                "retrying API request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn get(&self, endpoint: &str) -> std::result::Result<Payload, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post<B>(&self, endpoint: &str, body: &B) -> std::result::Result<Payload, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(endpoint, RequestOptions::post().json(body)).await
    }

    pub async fn put<B>(&self, endpoint: &str, body: &B) -> std::result::Result<Payload, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(endpoint, RequestOptions::put().json(body)).await
    }

    pub async fn patch<B>(&self, endpoint: &str, body: &B) -> std::result::Result<Payload, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(endpoint, RequestOptions::patch().json(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> std::result::Result<Payload, ApiError> {
        self.request(endpoint, RequestOptions::delete()).await
    }

    /// GET `endpoint` and decode the structured body into `T`.
    ///
    /// # Errors
    /// Returns `StorefrontError::Api` for request failures and
    /// `StorefrontError::Decode` if the body is text or has the wrong shape.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.get(endpoint).await?.decode()
    }

    /// Resolve per-call overrides against the client defaults.
    fn plan(&self, options: &RequestOptions) -> std::result::Result<AttemptPlan, ApiError> {
        if let Some(message) = &options.body_error {
            return Err(ApiError::invalid_request(message.clone()));
        }

        let timeout = options.timeout.unwrap_or(self.timeout);
        if timeout.is_zero() {
            return Err(ApiError::invalid_request("timeout must be greater than zero"));
        }

        let mut headers = self.default_headers.clone();
        for (name, value) in &options.headers {
            let (name, value) = parse_header(name, value).map_err(ApiError::invalid_request)?;
            headers.insert(name, value);
        }

        Ok(AttemptPlan {
            headers,
            timeout,
            max_retries: options.max_retries.unwrap_or(self.max_retries),
            retry_base_delay: options.retry_base_delay.unwrap_or(self.retry_base_delay),
        })
    }

    /// One send plus body read, bounded by the plan's timeout.
    async fn attempt(
        &self,
        url: &str,
        options: &RequestOptions,
        plan: &AttemptPlan,
    ) -> std::result::Result<Payload, ApiError> {
        let deadline = plan.timeout;
        let mut builder =
            self.client.request(options.method.clone(), url).headers(plan.headers.clone());
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await.map_err(|e| e.into_api_error(deadline))?;
            let status = response.status();
            debug!(%status, "received API response");

            if options.accepts(status) {
                read_payload(response, deadline).await
            } else {
                // The body is only used for the message; an unreadable one
                // falls back to the status line.
                let body = response.text().await.unwrap_or_default();
                Err(protocol_failure(status, &body, options.is_marked_retryable(status)))
            }
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout(millis(deadline))),
        }
    }
}

fn log_terminal_failure(url: &str, attempts: u32, failure: &ApiError) {
    let classified = InfraError(failure.clone());
    if classified.severity() == ErrorSeverity::Critical {
        error!(attempts, %url, error = %failure, "API request rejected");
    } else {
        debug!(attempts, %url, error = %failure, "API request failed with non-retryable error");
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_header(name: &str, value: &str) -> std::result::Result<(HeaderName, HeaderValue), String> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| format!("invalid header name '{name}': {e}"))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| format!("invalid value for header '{name}': {e}"))?;
    Ok((header_name, header_value))
}

const DEFAULT_USER_AGENT: &str = concat!("storefront-infra/", env!("CARGO_PKG_VERSION"));

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    config: ApiConfig,
    backoff: Backoff,
    user_agent: Option<String>,
    http_client: Option<ReqwestClient>,
}

impl ApiClientBuilder {
    fn new(config: ApiConfig) -> Self {
        Self { config, backoff: Backoff::new(), user_agent: None, http_client: None }
    }

    /// Default per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Default number of retries after the first attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry_base_delay = delay;
        self
    }

    /// Header sent with every request unless the call overrides it
    ///
    /// Replaces an earlier default whose name differs only in case.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.config.default_headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.config.default_headers.insert(name, value.into());
        self
    }

    /// Backoff policy, e.g. with jitter or a delay cap
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Reuse an existing connection pool instead of creating one
    pub fn http_client(mut self, client: ReqwestClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// # Errors
    /// Returns `StorefrontError::Config` for an invalid base URL, a zero
    /// timeout, malformed default headers, or if the HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.config.default_headers {
            let (name, value) = parse_header(name, value).map_err(StorefrontError::Config)?;
            default_headers.insert(name, value);
        }

        let client = match self.http_client {
            Some(client) => client,
            None => {
                let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
                ReqwestClient::builder().user_agent(agent).no_proxy().build().map_err(|e| {
                    StorefrontError::Config(format!("failed to create HTTP client: {e}"))
                })?
            }
        };

        Ok(ApiClient {
            client,
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            timeout: self.config.timeout,
            max_retries: self.config.max_retries,
            retry_base_delay: self.config.retry_base_delay,
            default_headers,
            backoff: self.backoff,
        })
    }
}
