//! Key Generation Module
//!
//! Produces the random identifiers entries are stored under. Keys are drawn
//! independently of what is already stored, so callers must expect the
//! occasional collision and retry.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

// == Public Constants ==
/// Characters a generated key may contain (base62).
pub const KEY_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of characters in a generated key.
pub const KEY_LENGTH: usize = 16;

const ALPHABET_LEN: usize = KEY_ALPHABET.len();

// Bytes at or above this value are rejected so every character stays equally likely.
const ACCEPT_BELOW: u8 = (256 / ALPHABET_LEN * ALPHABET_LEN) as u8;

// == Errors ==
/// The operating system random source could not be read.
#[derive(Debug, Error)]
#[error("Random source failed: {0}")]
pub struct KeyGenError(#[from] rand::Error);

// == Key Generator ==
/// Source of candidate keys for new entries.
pub trait KeyGenerator: Send + Sync {
    /// Returns a fresh candidate key.
    fn generate(&self) -> Result<String, KeyGenError>;
}

/// Generates [`KEY_LENGTH`] base62 characters from the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> Result<String, KeyGenError> {
        let mut key = String::with_capacity(KEY_LENGTH);
        let mut buf = [0u8; KEY_LENGTH * 2];

        while key.len() < KEY_LENGTH {
            OsRng.try_fill_bytes(&mut buf)?;

            for byte in buf.iter().copied().filter(|b| *b < ACCEPT_BELOW) {
                if key.len() == KEY_LENGTH {
                    break;
                }
                key.push(KEY_ALPHABET[byte as usize % ALPHABET_LEN] as char);
            }
        }

        Ok(key)
    }
}
