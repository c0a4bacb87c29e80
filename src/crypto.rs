//! Payload Encryption Module
//!
//! Seals payloads with AES-256-GCM before they reach the durable store.
//! A sealed blob is laid out as `nonce || ciphertext || tag`, with a fresh
//! random nonce for every call to [`CipherBox::encrypt`].

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

// == Public Constants ==
/// Raw key length required by AES-256.
pub const KEY_SIZE: usize = 32;

/// GCM nonce length prefixed to every sealed blob.
pub const NONCE_SIZE: usize = 12;

// == Cipher Error ==
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key is not valid base64 or has the wrong length
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Blob is truncated, tampered with, or sealed under another key
    #[error("Ciphertext failed integrity check")]
    Integrity,

    /// Sealing failed
    #[error("Encryption failed")]
    Encryption,
}

// == Cipher Box ==
/// Authenticated encryption under a pre-shared symmetric key.
#[derive(Clone)]
pub struct CipherBox {
    aead: Aes256Gcm,
}

impl CipherBox {
    /// Builds a cipher from a base64-encoded 32 byte key.
    pub fn new(encoded_key: &str) -> Result<Self, CipherError> {
        let key = STANDARD
            .decode(encoded_key.trim())
            .map_err(|_| CipherError::InvalidKey("key is not valid base64".to_string()))?;

        Self::from_bytes(&key)
    }

    /// Builds a cipher from raw key bytes.
    pub fn from_bytes(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_SIZE {
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE,
                key.len()
            )));
        }

        let aead = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        Ok(Self { aead })
    }

    /// Seals `plaintext` under a fresh nonce and returns `nonce || sealed`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Opens a blob produced by [`CipherBox::encrypt`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < NONCE_SIZE {
            return Err(CipherError::Integrity);
        }

        let (nonce, sealed) = blob.split_at(NONCE_SIZE);
        self.aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Integrity)
    }
}

impl fmt::Debug for CipherBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherBox").finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_cipher() -> CipherBox {
        CipherBox::from_bytes(&[7u8; KEY_SIZE]).unwrap()
    }

    #[test]
    fn test_new_accepts_base64_key() {
        let encoded = STANDARD.encode([1u8; KEY_SIZE]);
        assert!(CipherBox::new(&encoded).is_ok());
    }

    #[test]
    fn test_new_rejects_invalid_base64() {
        let result = CipherBox::new("not base64 at all!");
        assert!(matches!(result, Err(CipherError::InvalidKey(_))));
    }

    #[test]
    fn test_new_rejects_wrong_key_length() {
        let encoded = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            CipherBox::new(&encoded),
            Err(CipherError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_encrypt_prefixes_nonce() {
        let blob = test_cipher().encrypt(b"hello").unwrap();
        // nonce + plaintext + 16 byte tag
        assert_eq!(blob.len(), NONCE_SIZE + 5 + 16);
    }

    #[test]
    fn test_same_plaintext_encrypts_differently() {
        let cipher = test_cipher();
        let first = cipher.encrypt(b"hello").unwrap();
        let second = cipher.encrypt(b"hello").unwrap();
        assert_ne!(first, second);
        assert_ne!(first[..NONCE_SIZE], second[..NONCE_SIZE]);
    }

    #[test]
    fn test_empty_plaintext_round_trips() {
        let cipher = test_cipher();
        let blob = cipher.encrypt(b"").unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decrypt_rejects_short_blob() {
        let result = test_cipher().decrypt(&[0u8; NONCE_SIZE - 1]);
        assert!(matches!(result, Err(CipherError::Integrity)));
    }

    #[test]
    fn test_decrypt_rejects_tampered_blob() {
        let cipher = test_cipher();
        let mut blob = cipher.encrypt(b"hello").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(cipher.decrypt(&blob), Err(CipherError::Integrity)));
    }

    #[test]
    fn test_decrypt_rejects_wrong_key() {
        let blob = test_cipher().encrypt(b"hello").unwrap();
        let other = CipherBox::from_bytes(&[8u8; KEY_SIZE]).unwrap();
        assert!(matches!(other.decrypt(&blob), Err(CipherError::Integrity)));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let rendered = format!("{:?}", test_cipher());
        assert_eq!(rendered, "CipherBox { .. }");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_decrypt_inverts_encrypt(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
            let cipher = test_cipher();
            let blob = cipher.encrypt(&payload).unwrap();
            prop_assert_eq!(cipher.decrypt(&blob).unwrap(), payload);
        }
    }
}
