//! Request DTOs for the key-value API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Request body for the create operation (POST /v1/kv)
///
/// # Fields
/// - `text`: The payload. A JSON string is stored as its characters; any
///   other JSON value is stored as its serialized JSON text
/// - `content_type`: Optional content type (defaults to UTF-8 plain text)
/// - `ttl_seconds`: Optional TTL in seconds (uses the configured default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    /// The value to store
    #[serde(default)]
    pub text: Value,
    /// Optional content type
    #[serde(default)]
    pub content_type: Option<String>,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
}

impl CreateRequest {
    /// Returns the payload bytes to store. Missing or null text yields an empty payload.
    pub fn payload(&self) -> Vec<u8> {
        match &self.text {
            Value::Null => Vec::new(),
            Value::String(s) => s.as_bytes().to_vec(),
            other => other.to_string().into_bytes(),
        }
    }
}
