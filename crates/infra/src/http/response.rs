//! Response negotiation and error-body parsing

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use storefront_domain::{ApiError, Payload};

use crate::errors::IntoApiError;

/// `application/json` or any `+json` media type
pub(crate) fn is_structured_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Read an accepted response, negotiating the body format by content type.
///
/// An empty structured body decodes to `null`; a structured body that does
/// not parse is reported as a network failure like any other unreadable body.
pub(crate) async fn read_payload(response: Response, deadline: Duration) -> Result<Payload, ApiError> {
    let structured = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_structured_content_type);

    let bytes = response.bytes().await.map_err(|e| e.into_api_error(deadline))?;

    if !structured {
        return Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Structured(Value::Null));
    }

    serde_json::from_slice(&bytes)
        .map(Payload::Structured)
        .map_err(|e| ApiError::network(format!("invalid structured response body: {e}")))
}

/// Build the protocol failure for a rejected status.
///
/// The message comes from a structured body's `message` or `error` field and
/// falls back to the status line. `code` may be a string or a number.
pub(crate) fn protocol_failure(status: StatusCode, body: &str, marked_retryable: bool) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = |name: &str| parsed.as_ref().and_then(|value| value.get(name));

    let message = field("message")
        .or_else(|| field("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| status_line(status));

    let code = field("code").and_then(|code| match code {
        Value::String(code) => Some(code.clone()),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    });

    let mut error = ApiError::protocol(status.as_u16(), message);
    if marked_retryable {
        error = error.with_retryable(true);
    }
    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

fn status_line(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(|| status.as_u16().to_string(), str::to_owned)
}
