//! Persisted state namespace.
//!
//! Every collection lives as one JSON document under a string key inside a
//! namespace (one namespace per browser profile / session). Documents carry a
//! version so read-modify-write cycles can detect a concurrent writer instead
//! of silently losing its change.

pub mod document;
pub mod keys;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use document::Document;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored value and the version it was written at.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned {
    pub value: serde_json::Value,
    pub version: u64,
}

/// Condition a write must satisfy to be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional, last write wins.
    Any,
    /// The key must not exist yet.
    Absent,
    /// The key must still be at this version.
    Version(u64),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("concurrent update on `{key}`")]
    Conflict { key: String },

    #[error("stored value under `{key}` is malformed: {source}")]
    Corrupt { key: String, #[source] source: serde_json::Error },

    #[error("failed to encode value for `{key}`: {source}")]
    Encode { key: String, #[source] source: serde_json::Error },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Versioned>, StorageError>;

    /// Writes `value` if `precondition` holds and returns the new version.
    async fn put(&self, namespace: &str, key: &str, value: serde_json::Value, precondition: Precondition) -> Result<u64, StorageError>;

    /// Removes the key. Removing an absent key is not an error.
    async fn delete(&self, namespace: &str, key: &str, precondition: Precondition) -> Result<(), StorageError>;

    async fn health_check(&self) -> bool { true }
}
