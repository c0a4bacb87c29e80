//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::DEFAULT_CAPACITY;
use crate::error::KvError;

// == Defaults ==
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://kvtxt.db";
const DEFAULT_TTL_SECS: i64 = 5_184_000;
const DEFAULT_MIN_TTL_SECS: i64 = 1;
const DEFAULT_MAX_TTL_SECS: i64 = 31_536_000;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_MAX_PAYLOAD_MB: usize = 50;
const MAX_PAYLOAD_MB_RANGE: std::ops::RangeInclusive<usize> = 1..=200;

// == Config Error ==
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// == TTL Policy ==
/// Allowed TTL range and the TTL applied when a write does not give one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Smallest accepted TTL in seconds
    pub min_seconds: i64,
    /// Largest accepted TTL in seconds
    pub max_seconds: i64,
    /// TTL for writes without one, None = never expire
    pub default_seconds: Option<i64>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            min_seconds: DEFAULT_MIN_TTL_SECS,
            max_seconds: DEFAULT_MAX_TTL_SECS,
            default_seconds: Some(DEFAULT_TTL_SECS),
        }
    }
}

impl TtlPolicy {
    /// Resolves a requested TTL to the TTL to store.
    ///
    /// An explicit TTL outside `[min_seconds, max_seconds]` is rejected.
    pub fn resolve(&self, requested: Option<i64>) -> Result<Option<i64>, KvError> {
        let ttl = match requested {
            Some(ttl) => ttl,
            None => return Ok(self.default_seconds),
        };

        if ttl < self.min_seconds {
            return Err(KvError::InvalidInput(format!(
                "TTL must be at least {} seconds",
                self.min_seconds
            )));
        }
        if ttl > self.max_seconds {
            return Err(KvError::InvalidInput(format!(
                "TTL exceeds maximum of {} seconds",
                self.max_seconds
            )));
        }

        Ok(Some(ttl))
    }
}

/// Server configuration parameters.
///
/// All values except the encryption key can be configured via environment
/// variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Base64-encoded AES-256 key
    pub encryption_key: String,
    /// Maximum number of entries the read cache can hold
    pub cache_capacity: usize,
    /// TTL bounds and default
    pub ttl: TtlPolicy,
    /// Expiry reconciler interval in seconds
    pub cleanup_interval_secs: u64,
    /// Request body limit in megabytes
    pub max_payload_mb: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATABASE_URL` - SQLite location (default: sqlite://kvtxt.db)
    /// - `ENCRYPTION_KEY` - base64 of 32 bytes (required)
    /// - `CACHE_CAPACITY` - Maximum cached entries (default: 1000)
    /// - `DEFAULT_TTL` - TTL in seconds for writes without one, 0 = never expire (default: 5184000)
    /// - `MIN_TTL` / `MAX_TTL` - Accepted TTL range in seconds (default: 1 / 31536000)
    /// - `CLEANUP_INTERVAL` - Reconciler period in seconds (default: 1800)
    /// - `MAX_PAYLOAD_MB` - Request body limit, 1 to 200 (default: 50)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encryption_key = lookup("ENCRYPTION_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("ENCRYPTION_KEY"))?;

        let cache_capacity = match parse_or(&lookup, "CACHE_CAPACITY", DEFAULT_CAPACITY as i64) {
            n if n > 0 => n as usize,
            _ => DEFAULT_CAPACITY,
        };

        let cleanup_interval_secs = match parse_or(
            &lookup,
            "CLEANUP_INTERVAL",
            DEFAULT_CLEANUP_INTERVAL_SECS,
        ) {
            0 => DEFAULT_CLEANUP_INTERVAL_SECS,
            n => n,
        };

        let max_payload_mb = parse_or(&lookup, "MAX_PAYLOAD_MB", DEFAULT_MAX_PAYLOAD_MB);
        if !MAX_PAYLOAD_MB_RANGE.contains(&max_payload_mb) {
            return Err(ConfigError::Invalid {
                name: "MAX_PAYLOAD_MB",
                reason: format!(
                    "{} is outside {}..={}",
                    max_payload_mb,
                    MAX_PAYLOAD_MB_RANGE.start(),
                    MAX_PAYLOAD_MB_RANGE.end()
                ),
            });
        }

        Ok(Self {
            server_port: parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            encryption_key,
            cache_capacity,
            ttl: ttl_policy(&lookup)?,
            cleanup_interval_secs,
            max_payload_mb,
        })
    }

    /// Reconciler period.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Request body limit in bytes.
    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_mb * 1024 * 1024
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("encryption_key", &"<redacted>")
            .field("cache_capacity", &self.cache_capacity)
            .field("ttl", &self.ttl)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .field("max_payload_mb", &self.max_payload_mb)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn ttl_policy<F>(lookup: &F) -> Result<TtlPolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let min_seconds = parse_or(lookup, "MIN_TTL", DEFAULT_MIN_TTL_SECS);
    let max_seconds = parse_or(lookup, "MAX_TTL", DEFAULT_MAX_TTL_SECS);
    let default_ttl = parse_or(lookup, "DEFAULT_TTL", DEFAULT_TTL_SECS);

    if min_seconds < 1 {
        return Err(ConfigError::Invalid {
            name: "MIN_TTL",
            reason: "must be at least 1".to_string(),
        });
    }
    if min_seconds > max_seconds {
        return Err(ConfigError::Invalid {
            name: "MAX_TTL",
            reason: format!("must not be below MIN_TTL ({})", min_seconds),
        });
    }

    let default_seconds = match default_ttl {
        0 => None,
        ttl if (min_seconds..=max_seconds).contains(&ttl) => Some(ttl),
        ttl => {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_TTL",
                reason: format!(
                    "{} is outside {}..={} (use 0 for no expiry)",
                    ttl, min_seconds, max_seconds
                ),
            })
        }
    };

    Ok(TtlPolicy {
        min_seconds,
        max_seconds,
        default_seconds,
    })
}
