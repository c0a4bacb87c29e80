//! Lifecycle Tests
//!
//! Drives the service directly through write, read, expiry, eviction and
//! collision scenarios.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kvtxt::{
    cache::{current_timestamp, EntryCache},
    config::TtlPolicy,
    crypto::{CipherBox, KEY_SIZE},
    keys::{KeyGenError, KeyGenerator},
    service::MAX_KEY_ATTEMPTS,
    storage::{Entry, EntryStore},
    tasks::sweep_expired,
    KvError, KvService,
};
use parking_lot::Mutex;

// == Helper Functions ==

/// Hands out a fixed sequence of keys, repeating the last one when exhausted.
struct ScriptedKeys {
    keys: Mutex<VecDeque<String>>,
    last: String,
    calls: AtomicUsize,
}

impl ScriptedKeys {
    fn new(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            keys: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            last: keys.last().map(|k| k.to_string()).unwrap_or_default(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyGenerator for ScriptedKeys {
    fn generate(&self) -> Result<String, KeyGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().pop_front().unwrap_or_else(|| self.last.clone()))
    }
}

fn cipher() -> CipherBox {
    CipherBox::from_bytes(&[42u8; KEY_SIZE]).unwrap()
}

async fn service_with(capacity: usize, ttl: TtlPolicy) -> KvService {
    KvService::new(
        EntryStore::in_memory().await.unwrap(),
        cipher(),
        EntryCache::new(capacity),
        ttl,
    )
}

async fn service() -> KvService {
    service_with(100, TtlPolicy::default()).await
}

fn raw_entry(key: &str, payload: Vec<u8>) -> Entry {
    Entry {
        key: key.to_string(),
        payload,
        content_type: "text/plain".to_string(),
        created_at: current_timestamp(),
        expires_at: None,
    }
}

// == Expiry Lifecycle ==

#[tokio::test]
async fn test_entry_expires_then_is_purged() {
    let svc = service().await;

    let created = svc.write(b"hello".to_vec(), None, Some(2)).await.unwrap();
    let value = svc.read(&created.key).await.unwrap();
    assert_eq!(value.payload, b"hello");

    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(matches!(
        svc.read(&created.key).await,
        Err(KvError::Expired(_))
    ));

    let removed = sweep_expired(svc.store(), current_timestamp()).await.unwrap();
    assert_eq!(removed, 1);

    assert!(matches!(
        svc.read(&created.key).await,
        Err(KvError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_write_without_default_ttl_never_expires() {
    let ttl = TtlPolicy {
        default_seconds: None,
        ..TtlPolicy::default()
    };
    let svc = service_with(100, ttl).await;

    let created = svc.write(b"forever".to_vec(), None, None).await.unwrap();
    assert_eq!(created.expires_at, None);

    let removed = sweep_expired(svc.store(), i64::MAX).await.unwrap();
    assert_eq!(removed, 0);
    assert_eq!(svc.read(&created.key).await.unwrap().payload, b"forever");
}

// == Cache Behavior ==

#[tokio::test]
async fn test_cache_eviction_falls_back_to_store() {
    let svc = service_with(2, TtlPolicy::default()).await;

    let a = svc.write(b"A".to_vec(), None, None).await.unwrap().key;
    let b = svc.write(b"B".to_vec(), None, None).await.unwrap().key;
    let c = svc.write(b"C".to_vec(), None, None).await.unwrap().key;

    assert!(!svc.cache().contains(&a));
    assert!(svc.cache().contains(&b));
    assert!(svc.cache().contains(&c));

    assert_eq!(svc.read(&a).await.unwrap().payload, b"A");

    assert!(svc.cache().contains(&a));
    assert!(!svc.cache().contains(&b));
    assert!(svc.cache().contains(&c));
    assert_eq!(svc.cache().stats().evictions, 2);
}

// == Key Collisions ==

#[tokio::test]
async fn test_collision_retries_with_new_key() {
    let keys = ScriptedKeys::new(&["taken", "taken", "fresh"]);
    let svc = service().await.with_key_generator(keys.clone());
    svc.store()
        .insert(&raw_entry("taken", vec![0; 32]))
        .await
        .unwrap();

    let created = svc.write(b"payload".to_vec(), None, None).await.unwrap();

    assert_eq!(created.key, "fresh");
    assert_eq!(keys.calls(), 3);
    assert_eq!(svc.store().count().await.unwrap(), 2);
    assert_eq!(svc.read("fresh").await.unwrap().payload, b"payload");
}

#[tokio::test]
async fn test_collision_retries_are_bounded() {
    let keys = ScriptedKeys::new(&["taken"]);
    let svc = service().await.with_key_generator(keys.clone());
    svc.store()
        .insert(&raw_entry("taken", vec![0; 32]))
        .await
        .unwrap();

    let result = svc.write(b"payload".to_vec(), None, None).await;

    assert!(matches!(
        result,
        Err(KvError::KeySpaceExhausted(n)) if n == MAX_KEY_ATTEMPTS
    ));
    assert_eq!(keys.calls(), MAX_KEY_ATTEMPTS as usize);
    assert_eq!(svc.store().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_expired_row_still_blocks_its_key() {
    let keys = ScriptedKeys::new(&["stale", "next"]);
    let svc = service().await.with_key_generator(keys);
    let mut stale = raw_entry("stale", vec![0; 32]);
    stale.expires_at = Some(current_timestamp() - 100);
    svc.store().insert(&stale).await.unwrap();

    let created = svc.write(b"payload".to_vec(), None, None).await.unwrap();

    assert_eq!(created.key, "next");
}

// == Failure Modes ==

#[tokio::test]
async fn test_storage_failure_is_not_retried() {
    let keys = ScriptedKeys::new(&["a", "b", "c"]);
    let svc = service().await.with_key_generator(keys.clone());
    svc.store().close().await;

    let result = svc.write(b"payload".to_vec(), None, None).await;

    assert!(matches!(result, Err(KvError::Storage(_))));
    assert_eq!(keys.calls(), 1);
}

#[tokio::test]
async fn test_tampered_ciphertext_fails_integrity() {
    let svc = service().await;
    svc.store()
        .insert(&raw_entry("garbage", vec![7; 64]))
        .await
        .unwrap();

    assert!(matches!(svc.read("garbage").await, Err(KvError::Integrity)));
    assert!(!svc.cache().contains("garbage"));
}

#[tokio::test]
async fn test_foreign_key_cannot_decrypt() {
    let svc = service().await;
    let created = svc.write(b"secret".to_vec(), None, None).await.unwrap();
    let row = svc.store().get(&created.key).await.unwrap().unwrap();

    let other = CipherBox::from_bytes(&[43u8; KEY_SIZE]).unwrap();
    assert!(other.decrypt(&row.payload).is_err());
    assert_eq!(cipher().decrypt(&row.payload).unwrap(), b"secret");
}

#[tokio::test]
async fn test_rejected_writes_leave_no_trace() {
    let svc = service().await;

    assert!(matches!(
        svc.write(Vec::new(), None, None).await,
        Err(KvError::InvalidInput(_))
    ));
    assert!(matches!(
        svc.write(b"x".to_vec(), None, Some(0)).await,
        Err(KvError::InvalidInput(_))
    ));
    assert!(matches!(
        svc.write(b"x".to_vec(), None, Some(TtlPolicy::default().max_seconds + 1))
            .await,
        Err(KvError::InvalidInput(_))
    ));

    assert_eq!(svc.store().count().await.unwrap(), 0);
    assert!(svc.cache().is_empty());
}

// == Concurrency ==

#[tokio::test]
async fn test_concurrent_writes_get_distinct_keys() {
    let svc = Arc::new(service().await);

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                svc.write(format!("value-{i}").into_bytes(), None, None)
                    .await
                    .unwrap()
                    .key
            })
        })
        .collect();

    let mut keys = Vec::new();
    for handle in handles {
        keys.push(handle.await.unwrap());
    }

    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 50);
    assert_eq!(svc.store().count().await.unwrap(), 50);
}
