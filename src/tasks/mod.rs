//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry reconciler: purges expired rows from the durable store

mod reconciler;

pub use reconciler::{spawn_reconciler, sweep_expired};
