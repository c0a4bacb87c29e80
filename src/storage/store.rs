//! Entry Store Module
//!
//! SQLite-backed table of entries. Key uniqueness is enforced by the primary
//! key constraint, so concurrent writers never need application-level locks.
//! Reads do not filter by expiry; that check belongs to the caller.

use std::str::FromStr;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use thiserror::Error;

use crate::storage::Entry;

// == Constants ==
const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    payload BLOB NOT NULL,
    content_type TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER
)
"#;

// == Store Error ==
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with this key already exists
    #[error("Key already exists: {0}")]
    DuplicateKey(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// == Entry Store ==
/// Handle to the entries table. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct EntryStore {
    pool: SqlitePool,
}

impl EntryStore {
    // == Constructors ==
    /// Opens (creating if missing) the database at `url` and applies the schema.
    ///
    /// File databases run in WAL mode with `synchronous = NORMAL`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    // == Insert ==
    /// Persists a new row, failing with [`StoreError::DuplicateKey`] if the key is taken.
    ///
    /// Expired rows that have not been swept yet still occupy their key.
    pub async fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO entries (key, payload, content_type, created_at, expires_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.key.as_str())
        .bind(entry.payload.as_slice())
        .bind(entry.content_type.as_str())
        .bind(entry.created_at)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateKey(entry.key.clone()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    // == Get ==
    /// Point lookup by key. Expired rows are returned as-is.
    pub async fn get(&self, key: &str) -> Result<Option<Entry>, StoreError> {
        let entry = sqlx::query_as::<_, Entry>(
            "SELECT key, payload, content_type, created_at, expires_at \
             FROM entries WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    // == Delete Expired ==
    /// Deletes every row whose `expires_at` is set and `<= now`.
    ///
    /// Returns the number of rows removed.
    pub async fn delete_expired(&self, now: i64) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM entries WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    // == Ping ==
    /// Liveness check for readiness reporting.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Number of stored rows, expired or not.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Closes the pool. Later calls fail with [`StoreError::Database`].
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
