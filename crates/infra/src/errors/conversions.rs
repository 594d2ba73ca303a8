//! Conversions from transport errors into the API failure taxonomy.

use std::time::Duration;

use reqwest::Error as HttpError;
use storefront_common::error::{ErrorClassification, ErrorSeverity};
use storefront_domain::{ApiError, StorefrontError};

/// Error newtype that keeps transport conversions and classification on the
/// infrastructure side and can be converted back into the domain error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraError(pub ApiError);

impl From<InfraError> for ApiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ApiError> for InfraError {
    fn from(value: ApiError) -> Self {
        InfraError(value)
    }
}

impl From<InfraError> for StorefrontError {
    fn from(value: InfraError) -> Self {
        StorefrontError::Api(value.0)
    }
}

/// Classify a transport failure of an attempt bounded by `deadline`.
pub trait IntoApiError {
    fn into_api_error(self, deadline: Duration) -> ApiError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for HttpError {
    fn into_api_error(self, deadline: Duration) -> ApiError {
        if self.is_timeout() {
            return ApiError::timeout(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        }

        // Nothing was sent: bad URL, unserializable body, invalid header.
        if self.is_builder() {
            return ApiError::invalid_request(self.to_string());
        }

        if self.is_connect() {
            return ApiError::network(format!("connection failed: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return ApiError::network(format!("failed to read response body: {self}"));
        }

        ApiError::network(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* Classification */
/* -------------------------------------------------------------------------- */

impl ErrorClassification for InfraError {
    fn is_retryable(&self) -> bool {
        self.0.is_retryable()
    }

    fn severity(&self) -> ErrorSeverity {
        match &self.0 {
            // Rejected credentials fail every request until someone intervenes.
            ApiError::Protocol { status: 401 | 403, .. } => ErrorSeverity::Critical,
            ApiError::Protocol { status: 404, .. } => ErrorSeverity::Info,
            ApiError::Protocol { status, .. } if *status >= 500 => ErrorSeverity::Error,
            ApiError::Protocol { .. } => ErrorSeverity::Warning,
            ApiError::Network { .. } | ApiError::Timeout { .. } => ErrorSeverity::Warning,
            ApiError::InvalidRequest { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;

    use super::*;

    #[test]
    fn classification_follows_status_class() {
        assert_eq!(InfraError(ApiError::protocol(503, "down")).severity(), ErrorSeverity::Error);
        assert_eq!(InfraError(ApiError::protocol(404, "missing")).severity(), ErrorSeverity::Info);
        assert_eq!(InfraError(ApiError::protocol(422, "bad")).severity(), ErrorSeverity::Warning);
        assert!(InfraError(ApiError::protocol(401, "denied")).is_critical());
        assert!(!InfraError(ApiError::timeout(10)).is_critical());
    }

    #[test]
    fn retryability_matches_taxonomy() {
        assert!(InfraError(ApiError::network("reset")).is_retryable());
        assert!(InfraError(ApiError::protocol(500, "boom")).is_retryable());
        assert!(!InfraError(ApiError::protocol(400, "bad")).is_retryable());
    }

    #[test]
    fn converts_back_into_domain_errors() {
        let err: StorefrontError = InfraError(ApiError::timeout(5)).into();
        assert_eq!(err.as_api(), Some(&ApiError::timeout(5)));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        // Bind then drop to get a port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let client = Client::builder().no_proxy().build().unwrap();

        let err = client.get(format!("http://127.0.0.1:{port}/")).send().await.unwrap_err();
        let mapped = err.into_api_error(Duration::from_secs(1));
        assert!(matches!(mapped, ApiError::Network { .. }), "got {mapped:?}");
    }

    #[tokio::test]
    async fn malformed_url_maps_to_invalid_request() {
        let client = Client::builder().no_proxy().build().unwrap();

        let err = client.get("http://exa mple.com/").send().await.unwrap_err();
        let mapped = err.into_api_error(Duration::from_secs(1));
        assert!(matches!(mapped, ApiError::InvalidRequest { .. }), "got {mapped:?}");
    }
}
