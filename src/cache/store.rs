//! Entry Cache Module
//!
//! Bounded write-through cache of decrypted entries. Combines the LRU map
//! with lazy TTL expiry behind a single mutex, so a reader never observes a
//! half-updated entry.
//!
//! The cache is never authoritative: a miss means "ask the durable store".
//! Its own `expires_at` check is what keeps a stale entry from being served
//! after the durable row's TTL has lapsed, whether or not the row has been
//! swept yet.

use parking_lot::Mutex;

use crate::cache::{current_timestamp, CacheEntry, CacheStats, LruMap, DEFAULT_CAPACITY};

#[derive(Debug)]
struct Inner {
    entries: LruMap<CacheEntry>,
    stats: CacheStats,
}

// == Entry Cache ==
/// Thread-safe LRU cache with lazy TTL expiration.
#[derive(Debug)]
pub struct EntryCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl EntryCache {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A zero capacity falls back to [`DEFAULT_CAPACITY`]. Storage grows on
    /// demand; at most [`DEFAULT_CAPACITY`] slots are reserved up front.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        Self {
            inner: Mutex::new(Inner {
                entries: LruMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                stats: CacheStats::new(),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Get ==
    /// Returns `(payload, content_type)` for a live entry and promotes it.
    ///
    /// An entry whose TTL has lapsed is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.get_at(key, current_timestamp())
    }

    /// [`EntryCache::get`] evaluated against an explicit `now` (Unix seconds).
    pub fn get_at(&self, key: &str, now: i64) -> Option<(Vec<u8>, String)> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.peek(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                inner.stats.record_miss();
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.stats.record_expiration();
            inner.stats.record_miss();
            return None;
        }

        inner.stats.record_hit();
        inner
            .entries
            .get(key)
            .map(|entry| (entry.payload.clone(), entry.content_type.clone()))
    }

    // == Set ==
    /// Inserts or overwrites `key` as the most recently used entry.
    ///
    /// When a new key pushes the cache past capacity, the least recently used
    /// entry is evicted whether or not it has expired.
    pub fn set(
        &self,
        key: String,
        payload: Vec<u8>,
        content_type: String,
        expires_at: Option<i64>,
    ) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner
            .entries
            .put(key, CacheEntry::new(payload, content_type, expires_at));

        while inner.entries.len() > self.capacity {
            match inner.entries.pop_lru() {
                Some(_) => inner.stats.record_eviction(),
                None => break,
            }
        }
    }

    // == Inspection ==
    /// Whether `key` is cached, ignoring expiry and without promoting it.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Cached keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .entries
            .keys()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        inner.stats.snapshot(inner.entries.len(), self.capacity)
    }
}
