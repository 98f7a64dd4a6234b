use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{KeyValueStorePort, StorageError, StoreOp};

/// Key-value store backed by a single SQLite table
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        // Create table if not exists
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

const UPSERT: &str =
    "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)";
const DELETE: &str = "DELETE FROM kv_store WHERE key = ?";

#[async_trait]
impl KeyValueStorePort for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query(DELETE)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn apply_batch(&self, ops: Vec<StoreOp>) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for op in &ops {
            match op {
                StoreOp::Set { key, value } => {
                    sqlx::query(UPSERT)
                        .bind(key)
                        .bind(value)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_error)?;
                }
                StoreOp::Remove { key } => {
                    sqlx::query(DELETE)
                        .bind(key)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_error)?;
                }
            }
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit().await.map_err(db_error)
    }
}
