//! Typed handle on one key of a namespace.

use std::marker::PhantomData;
use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use super::{KeyValueStore, Precondition, StorageError};

pub struct Document<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: Arc<str>,
    key: String,
    max_attempts: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), namespace: self.namespace.clone(), key: self.key.clone(), max_attempts: self.max_attempts, _marker: PhantomData }
    }
}

impl<T> std::fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("namespace", &self.namespace).field("key", &self.key).finish()
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: Arc<str>, key: impl Into<String>, max_attempts: u32) -> Self {
        Self { store, namespace, key: key.into(), max_attempts: max_attempts.max(1), _marker: PhantomData }
    }

    pub fn key(&self) -> &str { &self.key }

    /// Absent keys read as the default value.
    pub async fn load(&self) -> Result<T, StorageError> {
        Ok(self.load_versioned().await?.0)
    }

    pub async fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.store.get(&self.namespace, &self.key).await?.is_some())
    }

    async fn load_versioned(&self) -> Result<(T, Precondition), StorageError> {
        match self.store.get(&self.namespace, &self.key).await? {
            Some(stored) => {
                let value = serde_json::from_value(stored.value)
                    .map_err(|source| StorageError::Corrupt { key: self.key.clone(), source })?;
                Ok((value, Precondition::Version(stored.version)))
            }
            None => Ok((T::default(), Precondition::Absent)),
        }
    }

    fn encode(&self, value: &T) -> Result<serde_json::Value, StorageError> {
        serde_json::to_value(value).map_err(|source| StorageError::Encode { key: self.key.clone(), source })
    }

    /// Unconditional overwrite. The last writer wins.
    pub async fn replace(&self, value: &T) -> Result<(), StorageError> {
        let encoded = self.encode(value)?;
        self.store.put(&self.namespace, &self.key, encoded, Precondition::Any).await?;
        Ok(())
    }

    pub async fn remove(&self) -> Result<(), StorageError> {
        self.store.delete(&self.namespace, &self.key, Precondition::Any).await
    }

    /// Read-modify-write guarded by the stored version.
    ///
    /// `mutate` runs against a freshly loaded value on every attempt and may
    /// run more than once. When it returns an error nothing is written. A
    /// version conflict reloads and retries up to the configured attempts.
    pub async fn update<R, E, F>(&self, mut mutate: F) -> Result<(T, R), E>
    where
        F: FnMut(&mut T) -> Result<R, E> + Send,
        R: Send,
        E: From<StorageError>,
    {
        let mut attempt = 1;
        loop {
            let (mut value, precondition) = self.load_versioned().await?;
            let outcome = mutate(&mut value)?;
            let encoded = self.encode(&value)?;
            match self.store.put(&self.namespace, &self.key, encoded, precondition).await {
                Ok(version) => {
                    debug!(namespace = %self.namespace, key = %self.key, version, "document updated");
                    return Ok((value, outcome));
                }
                Err(StorageError::Conflict { .. }) if attempt < self.max_attempts => {
                    warn!(namespace = %self.namespace, key = %self.key, attempt, "version conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Versioned};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn doc(store: Arc<dyn KeyValueStore>) -> Document<Vec<u32>> {
        Document::new(store, Arc::from("session"), "numbers", 3)
    }

    /// Lets another writer slip in between the first read and write.
    struct RacingStore { inner: MemoryStore, raced: AtomicBool }

    #[async_trait]
    impl KeyValueStore for RacingStore {
        async fn get(&self, namespace: &str, key: &str) -> Result<Option<Versioned>, StorageError> {
            self.inner.get(namespace, key).await
        }
        async fn put(&self, namespace: &str, key: &str, value: serde_json::Value, precondition: Precondition) -> Result<u64, StorageError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner.put(namespace, key, serde_json::json!([99]), Precondition::Any).await?;
            }
            self.inner.put(namespace, key, value, precondition).await
        }
        async fn delete(&self, namespace: &str, key: &str, precondition: Precondition) -> Result<(), StorageError> {
            self.inner.delete(namespace, key, precondition).await
        }
    }

    #[tokio::test]
    async fn test_absent_reads_default() {
        let d = doc(Arc::new(MemoryStore::new()));
        assert!(d.load().await.unwrap().is_empty());
        assert!(!d.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_conflict_retry_keeps_both_writes() {
        let store: Arc<dyn KeyValueStore> = Arc::new(RacingStore { inner: MemoryStore::new(), raced: AtomicBool::new(false) });
        let d = doc(store);
        let (value, ()) = d.update::<_, StorageError, _>(|v| { v.push(1); Ok(()) }).await.unwrap();
        assert_eq!(value, vec![99, 1]);
        assert_eq!(d.load().await.unwrap(), vec![99, 1]);
    }

    #[tokio::test]
    async fn test_failed_mutation_writes_nothing() {
        let d = doc(Arc::new(MemoryStore::new()));
        let result = d.update(|v: &mut Vec<u32>| { v.push(1); Err::<(), _>(StorageError::Conflict { key: "x".into() }) }).await;
        assert!(result.is_err());
        assert!(!d.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.put("session", "numbers", serde_json::json!({"not": "a list"}), Precondition::Any).await.unwrap();
        let err = doc(store).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
