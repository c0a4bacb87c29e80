//! API Module
//!
//! HTTP handlers and routing for the key-value REST API.
//!
//! # Endpoints
//! - `POST /v1/kv` - Store a text value, returns the generated key
//! - `GET /v1/kv/:key` - Retrieve a value by key
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//! - `GET /stats` - Read-cache statistics

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::*;
pub use routes::create_router;
pub use server::{serve, REQUEST_TIMEOUT, SHUTDOWN_TIMEOUT};
