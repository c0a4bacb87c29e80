//! Durable entry row.

/// A persisted entry. `payload` always holds ciphertext (`nonce || sealed`).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Entry {
    /// Generated key, unique among stored rows
    pub key: String,
    /// Encrypted payload
    pub payload: Vec<u8>,
    /// Content type supplied at write time
    pub content_type: String,
    /// Unix seconds at insert
    pub created_at: i64,
    /// Unix seconds after which the entry is expired, None = never
    pub expires_at: Option<i64>,
}

impl Entry {
    /// An entry is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires) if expires <= now)
    }
}
