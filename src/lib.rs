//! kvtxt - An encrypted key-value text store
//!
//! Stores text under short random keys, encrypted at rest with AES-256-GCM,
//! with per-entry TTL expiry and an LRU read cache in front of SQLite.

pub mod api;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod models;
pub mod service;
pub mod storage;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::KvError;
pub use service::KvService;
pub use tasks::spawn_reconciler;
