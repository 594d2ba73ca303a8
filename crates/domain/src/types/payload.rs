//! Decoded response bodies
//!
//! The upstream negotiates the body format through its content type. Rather
//! than handing out a dynamically-typed value, responses are tagged so that
//! adapters decode them explicitly with [`Payload::decode`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, StorefrontError};

/// Body of a successful upstream response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// The response declared a structured (JSON) content type.
    Structured(Value),
    /// Any other content type, kept verbatim.
    Text(String),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    pub fn into_structured(self) -> Option<Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Decode a structured payload into a typed value.
    ///
    /// # Errors
    /// Returns `StorefrontError::Decode` for text payloads and for structured
    /// payloads whose shape does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Structured(value) => T::deserialize(value)
                .map_err(|e| StorefrontError::Decode(format!("unexpected payload shape: {e}"))),
            Self::Text(text) => Err(StorefrontError::Decode(format!(
                "expected a structured payload, got {} bytes of text",
                text.len()
            ))),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
