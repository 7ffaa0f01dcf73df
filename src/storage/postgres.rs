//! Postgres backend. One row per (namespace, key) with a version column used
//! for compare-and-set writes.

use std::time::Duration;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use super::{KeyValueStore, Precondition, StorageError, Versioned};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .connect(database_url)
            .await?;
        info!("connected to postgres");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn version_of(row: Option<sqlx::postgres::PgRow>, key: &str) -> Result<u64, StorageError> {
    let row = row.ok_or_else(|| StorageError::Conflict { key: key.to_string() })?;
    let version: i64 = row.try_get("version")?;
    Ok(version as u64)
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Versioned>, StorageError> {
        let row = sqlx::query("SELECT value, version FROM kv_entries WHERE namespace = $1 AND key = $2")
            .bind(namespace).bind(key)
            .fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let value: serde_json::Value = row.try_get("value")?;
                let version: i64 = row.try_get("version")?;
                Ok(Some(Versioned { value, version: version as u64 }))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, namespace: &str, key: &str, value: serde_json::Value, precondition: Precondition) -> Result<u64, StorageError> {
        let row = match precondition {
            Precondition::Any => sqlx::query(
                "INSERT INTO kv_entries (namespace, key, value, version, updated_at) VALUES ($1, $2, $3, 1, NOW()) \
                 ON CONFLICT (namespace, key) DO UPDATE SET value = EXCLUDED.value, version = kv_entries.version + 1, updated_at = NOW() \
                 RETURNING version")
                .bind(namespace).bind(key).bind(&value)
                .fetch_optional(&self.pool).await?,
            Precondition::Absent => sqlx::query(
                "INSERT INTO kv_entries (namespace, key, value, version, updated_at) VALUES ($1, $2, $3, 1, NOW()) \
                 ON CONFLICT (namespace, key) DO NOTHING RETURNING version")
                .bind(namespace).bind(key).bind(&value)
                .fetch_optional(&self.pool).await?,
            Precondition::Version(expected) => sqlx::query(
                "UPDATE kv_entries SET value = $3, version = version + 1, updated_at = NOW() \
                 WHERE namespace = $1 AND key = $2 AND version = $4 RETURNING version")
                .bind(namespace).bind(key).bind(&value).bind(expected as i64)
                .fetch_optional(&self.pool).await?,
        };
        let version = version_of(row, key)?;
        debug!(namespace, key, version, "postgres put");
        Ok(version)
    }

    async fn delete(&self, namespace: &str, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        let result = match precondition {
            Precondition::Version(expected) => sqlx::query("DELETE FROM kv_entries WHERE namespace = $1 AND key = $2 AND version = $3")
                .bind(namespace).bind(key).bind(expected as i64)
                .execute(&self.pool).await?,
            Precondition::Any | Precondition::Absent => sqlx::query("DELETE FROM kv_entries WHERE namespace = $1 AND key = $2")
                .bind(namespace).bind(key)
                .execute(&self.pool).await?,
        };
        if result.rows_affected() == 0 && matches!(precondition, Precondition::Version(_)) && self.get(namespace, key).await?.is_some() {
            return Err(StorageError::Conflict { key: key.to_string() });
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
