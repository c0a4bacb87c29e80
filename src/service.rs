//! Key-Value Service
//!
//! Ties key generation, encryption, the durable store and the read cache
//! together into the write and read paths.
//!
//! The store is authoritative and the cache is write-through: it is filled
//! after a successful insert and after a read that had to go to the store.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{current_timestamp, EntryCache};
use crate::config::TtlPolicy;
use crate::crypto::CipherBox;
use crate::error::{KvError, Result};
use crate::keys::{KeyGenerator, RandomKeyGenerator};
use crate::storage::{Entry, EntryStore, StoreError};

// == Public Constants ==
/// Insert attempts per write before giving up on finding a free key.
pub const MAX_KEY_ATTEMPTS: u32 = 5;

/// Content type used when a write does not specify one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const MAX_CONTENT_TYPE_LENGTH: usize = 255;
const MAX_KEY_LENGTH: usize = 256;

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntry {
    pub key: String,
    pub expires_at: Option<i64>,
}

/// Plaintext returned by a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub payload: Vec<u8>,
    pub content_type: String,
}

// == KV Service ==
pub struct KvService {
    store: EntryStore,
    cipher: CipherBox,
    cache: EntryCache,
    keys: Arc<dyn KeyGenerator>,
    ttl: TtlPolicy,
}

impl KvService {
    /// Creates a service generating keys from the OS random source.
    pub fn new(store: EntryStore, cipher: CipherBox, cache: EntryCache, ttl: TtlPolicy) -> Self {
        Self {
            store,
            cipher,
            cache,
            keys: Arc::new(RandomKeyGenerator),
            ttl,
        }
    }

    /// Replaces the key generator.
    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // == Write ==
    /// Encrypts and stores `payload` under a freshly generated key.
    ///
    /// Key collisions are retried up to [`MAX_KEY_ATTEMPTS`] times; any other
    /// storage failure aborts immediately.
    pub async fn write(
        &self,
        payload: Vec<u8>,
        content_type: Option<String>,
        ttl_seconds: Option<i64>,
    ) -> Result<CreatedEntry> {
        let content_type = content_type
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        validate_payload(&payload, &content_type)?;
        let ttl = self.ttl.resolve(ttl_seconds)?;

        let created_at = current_timestamp();
        let expires_at = match ttl {
            Some(ttl) => Some(
                created_at
                    .checked_add(ttl)
                    .ok_or_else(|| KvError::InvalidInput("TTL is too large".to_string()))?,
            ),
            None => None,
        };

        let mut entry = Entry {
            key: String::new(),
            payload: self.cipher.encrypt(&payload)?,
            content_type,
            created_at,
            expires_at,
        };

        let mut inserted = false;
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            entry.key = self.keys.generate()?;

            match self.store.insert(&entry).await {
                Ok(()) => {
                    inserted = true;
                    break;
                }
                Err(StoreError::DuplicateKey(_)) => {
                    debug!(attempt, "generated key already in use, retrying");
                }
                Err(e) => return Err(KvError::Storage(e)),
            }
        }

        if !inserted {
            return Err(KvError::KeySpaceExhausted(MAX_KEY_ATTEMPTS));
        }

        self.cache.set(
            entry.key.clone(),
            payload,
            entry.content_type,
            entry.expires_at,
        );

        Ok(CreatedEntry {
            key: entry.key,
            expires_at: entry.expires_at,
        })
    }

    // == Read ==
    /// Returns the plaintext stored under `key`.
    ///
    /// Fails with [`KvError::Expired`] when the row exists but its TTL has
    /// lapsed, and [`KvError::NotFound`] when there is no row at all.
    pub async fn read(&self, key: &str) -> Result<StoredValue> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(KvError::NotFound(key.to_string()));
        }

        if let Some((payload, content_type)) = self.cache.get(key) {
            return Ok(StoredValue {
                payload,
                content_type,
            });
        }

        let entry = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| KvError::NotFound(key.to_string()))?;

        if entry.is_expired_at(current_timestamp()) {
            return Err(KvError::Expired(key.to_string()));
        }

        let payload = self.cipher.decrypt(&entry.payload)?;

        self.cache.set(
            entry.key,
            payload.clone(),
            entry.content_type.clone(),
            entry.expires_at,
        );

        Ok(StoredValue {
            payload,
            content_type: entry.content_type,
        })
    }
}

/// Checks the payload against its declared content type.
fn validate_payload(payload: &[u8], content_type: &str) -> Result<()> {
    if payload.is_empty() {
        return Err(KvError::InvalidInput("Text is required".to_string()));
    }

    if content_type.len() > MAX_CONTENT_TYPE_LENGTH
        || !content_type
            .bytes()
            .all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
    {
        return Err(KvError::InvalidInput("Invalid content type".to_string()));
    }

    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type == "application/json"
        && serde_json::from_slice::<serde::de::IgnoredAny>(payload).is_err()
    {
        return Err(KvError::InvalidInput("Invalid JSON body".to_string()));
    }

    if media_type.starts_with("text/") && std::str::from_utf8(payload).is_err() {
        return Err(KvError::InvalidInput("Invalid utf-8 text".to_string()));
    }

    Ok(())
}
