//! Cache Entry Module
//!
//! Decrypted payload plus the metadata needed to answer reads without
//! touching the durable store.

// == Cache Entry ==
/// A cached, already-decrypted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Plaintext payload
    pub payload: Vec<u8>,
    /// Content type reported back to readers
    pub content_type: String,
    /// Expiration timestamp (Unix seconds) copied from the durable row, None = no expiration
    pub expires_at: Option<i64>,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(payload: Vec<u8>, content_type: String, expires_at: Option<i64>) -> Self {
        Self {
            payload,
            content_type,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks the entry against `now` (Unix seconds).
    ///
    /// Boundary condition: the entry is expired once `now >= expires_at`,
    /// matching the durable store's sweep predicate.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
