//! API Handlers
//!
//! HTTP request handlers for each key-value endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::config::DEFAULT_MAX_PAYLOAD_MB;
use crate::error::{KvError, Result};
use crate::models::{CreateRequest, CreateResponse, HealthResponse, StatsResponse};
use crate::service::KvService;

use super::server::REQUEST_TIMEOUT;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Write/read orchestration over store, cipher and cache
    pub service: Arc<KvService>,
    /// Request body limit in bytes
    pub max_payload_bytes: usize,
    /// Per-request deadline, answered with 408 when exceeded
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState with the default body limit.
    pub fn new(service: KvService) -> Self {
        Self {
            service: Arc::new(service),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_MB * 1024 * 1024,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Handler for POST /v1/kv
///
/// Encrypts and stores the text, answering 201 with the generated key.
pub async fn create_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateResponse>)> {
    let Json(req) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            KvError::PayloadTooLarge("Request body too large".to_string())
        } else {
            KvError::InvalidInput(rejection.body_text())
        }
    })?;

    let payload = req.payload();
    let created = state
        .service
        .write(payload, req.content_type, req.ttl_seconds)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse::new(created.key, created.expires_at)),
    ))
}

/// Handler for GET /v1/kv/:key
///
/// Returns the stored payload verbatim with its recorded Content-Type.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let value = state.service.read(&key).await?;

    Ok((
        [(header::CONTENT_TYPE, value.content_type)],
        value.payload,
    )
        .into_response())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handler for GET /ready
///
/// Ready only while the durable store answers.
pub async fn ready_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.service.store().ping().await.map_err(|e| {
        warn!(error = %e, "readiness check failed");
        KvError::Unavailable(e.to_string())
    })?;

    Ok(Json(HealthResponse::ok()))
}

/// Handler for GET /stats
///
/// Returns current read-cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.cache().stats()))
}
