//! Storage Module
//!
//! Durable, encrypted-at-rest persistence of entries in SQLite.

mod entry;
mod store;

pub use entry::Entry;
pub use store::{EntryStore, StoreError};
