//! In-process backend, used when no database is configured and in tests.

use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use super::{KeyValueStore, Precondition, StorageError, Versioned};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), Versioned>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Number of keys across all namespaces.
    pub async fn len(&self) -> usize { self.entries.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.entries.read().await.is_empty() }
}

fn check(current: Option<&Versioned>, precondition: Precondition, key: &str) -> Result<(), StorageError> {
    let holds = match (precondition, current) {
        (Precondition::Any, _) => true,
        (Precondition::Absent, None) => true,
        (Precondition::Version(expected), Some(entry)) => entry.version == expected,
        _ => false,
    };
    if holds { Ok(()) } else { Err(StorageError::Conflict { key: key.to_string() }) }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Versioned>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    async fn put(&self, namespace: &str, key: &str, value: serde_json::Value, precondition: Precondition) -> Result<u64, StorageError> {
        let mut entries = self.entries.write().await;
        let slot = (namespace.to_string(), key.to_string());
        check(entries.get(&slot), precondition, key)?;
        let version = entries.get(&slot).map_or(1, |e| e.version + 1);
        entries.insert(slot, Versioned { value, version });
        debug!(namespace, key, version, "memory put");
        Ok(version)
    }

    async fn delete(&self, namespace: &str, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        let slot = (namespace.to_string(), key.to_string());
        if entries.get(&slot).is_none() { return Ok(()); }
        check(entries.get(&slot), precondition, key)?;
        entries.remove(&slot);
        Ok(())
    }
}
