//! Error types for the key-value service
//!
//! Provides the service error taxonomy and its HTTP mapping using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::crypto::CipherError;
use crate::keys::KeyGenError;
use crate::models::ErrorResponse;
use crate::storage::StoreError;

// == KV Error Enum ==
/// Unified error type for write and read operations.
#[derive(Error, Debug)]
pub enum KvError {
    /// Bad payload, content type or TTL
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Key never existed or has been purged
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key exists but its TTL has lapsed
    #[error("Key expired: {0}")]
    Expired(String),

    /// Every generated key collided with an existing row
    #[error("Could not generate a unique key after {0} attempts")]
    KeySpaceExhausted(u32),

    /// Durable store failure other than a key collision
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Stored ciphertext failed authentication
    #[error("Stored value failed integrity check")]
    Integrity,

    /// Storage is not reachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CipherError> for KvError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Integrity => KvError::Integrity,
            other => KvError::Internal(other.to_string()),
        }
    }
}

impl From<KeyGenError> for KvError {
    fn from(err: KeyGenError) -> Self {
        KvError::Internal(err.to_string())
    }
}

impl KvError {
    /// HTTP status, error code and client-facing message.
    ///
    /// Server-side failures get a generic message; details go to the log.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            KvError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            KvError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            KvError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string()),
            KvError::Expired(_) => (StatusCode::GONE, "GONE", "Key expired".to_string()),
            KvError::KeySpaceExhausted(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Could not generate unique key".to_string(),
            ),
            KvError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Storage error".to_string(),
            ),
            KvError::Integrity => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Decryption failed".to_string(),
            ),
            KvError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                "Storage not ready".to_string(),
            ),
            KvError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the key-value service.
pub type Result<T> = std::result::Result<T, KvError>;
