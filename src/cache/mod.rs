//! Cache Module
//!
//! Bounded in-memory cache of decrypted entries with LRU eviction and lazy
//! TTL expiration.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp, CacheEntry};
pub use lru::{Keys, LruMap};
pub use stats::CacheStats;
pub use store::EntryCache;

// == Public Constants ==
/// Capacity used when the configured capacity is not positive
pub const DEFAULT_CAPACITY: usize = 1000;
