//! This module provides a concrete implementation of the `WhaleStore` using
//! SQLite.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};

use super::{error::PersistenceError, traits::WhaleStore};
use crate::models::{WhaleAddress, WhaleMatch};

/// A `WhaleStore` backed by a SQLite database.
pub struct SqliteWhaleStore {
    /// The SQLite connection pool used for database operations.
    pool: SqlitePool,
}

impl SqliteWhaleStore {
    /// Creates a new instance with the provided database URL. This will
    /// create the database file if it does not exist.
    #[tracing::instrument(level = "info")]
    pub async fn new(database_url: &str) -> Result<Self, PersistenceError> {
        tracing::debug!(database_url, "Attempting to connect to SQLite database.");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistenceError::InvalidInput(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            PersistenceError::OperationFailed(format!("Failed to connect to database: {}", e))
        })?;
        tracing::info!(database_url, "Successfully connected to SQLite database.");
        Ok(Self { pool })
    }

    /// Runs database migrations.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run database migrations.");
            PersistenceError::MigrationError(e.to_string())
        })?;
        tracing::info!("Database migrations completed successfully.");
        Ok(())
    }

    /// Closes the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl WhaleStore for SqliteWhaleStore {
    #[tracing::instrument(skip(self, matches), fields(count = matches.len()), level = "debug")]
    async fn upsert_transactions(&self, matches: &[WhaleMatch]) -> Result<(), PersistenceError> {
        if matches.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;

        for m in matches {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO transactions (
                    tx_hash, block_number, block_hash, transaction_index,
                    from_address, to_address, whale_address, whale_label,
                    direction, timestamp, value_eth, gas, gas_price,
                    gas_used, status, nonce, input_data, tx_type,
                    max_fee_per_gas, max_priority_fee
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&m.tx_hash)
            .bind(m.block_number as i64)
            .bind(&m.block_hash)
            .bind(m.transaction_index as i64)
            .bind(&m.from_address)
            .bind(&m.to_address)
            .bind(&m.whale_address)
            .bind(&m.whale_label)
            .bind(m.direction.as_str())
            .bind(m.timestamp)
            .bind(&m.value_eth)
            .bind(m.gas as i64)
            .bind(&m.gas_price)
            .bind(m.gas_used.map(|g| g as i64))
            .bind(m.status)
            .bind(m.nonce as i64)
            .bind(&m.input_data)
            .bind(m.tx_type as i64)
            .bind(&m.max_fee_per_gas)
            .bind(&m.max_priority_fee)
            .execute(&mut *tx)
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;
        tracing::debug!(count = matches.len(), "Upserted whale transactions.");
        Ok(())
    }

    #[tracing::instrument(skip(self, whales), fields(count = whales.len()), level = "info")]
    async fn replace_whale_addresses(
        &self,
        whales: Vec<WhaleAddress>,
    ) -> Result<(), PersistenceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;

        sqlx::query("DELETE FROM whale_addresses")
            .execute(&mut *tx)
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;

        for whale in &whales {
            sqlx::query(
                r#"
                INSERT INTO whale_addresses (address, label, is_watched, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&whale.address)
            .bind(&whale.label)
            .bind(whale.is_watched)
            .bind(whale.created_at)
            .bind(whale.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;
        tracing::info!(count = whales.len(), "Replaced whale address table.");
        Ok(())
    }

    async fn watched_addresses(&self) -> Result<Vec<WhaleAddress>, PersistenceError> {
        sqlx::query_as::<_, WhaleAddress>(
            "SELECT address, label, is_watched, created_at, updated_at
             FROM whale_addresses WHERE is_watched = 1 ORDER BY address",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PersistenceError::OperationFailed(e.to_string()))
    }

    #[tracing::instrument(skip(self), level = "info")]
    async fn delete_matches_older_than(&self, days: u32) -> Result<u64, PersistenceError> {
        let cutoff = Utc::now() - Duration::days(days as i64);
        let result = sqlx::query("DELETE FROM transactions WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError::OperationFailed(e.to_string()))?;
        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, days, "Deleted old whale transactions.");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferDirection;

    async fn setup_test_db() -> SqliteWhaleStore {
        let store = SqliteWhaleStore::new("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory db");
        store.run_migrations().await.expect("Failed to run migrations");
        store
    }

    fn sample_match(tx_hash: &str, block_number: u64) -> WhaleMatch {
        WhaleMatch {
            tx_hash: tx_hash.to_string(),
            block_number,
            block_hash: "0xbb".to_string(),
            transaction_index: 0,
            from_address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            to_address: Some("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string()),
            whale_address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            whale_label: "Test Whale".to_string(),
            direction: TransferDirection::From,
            timestamp: Utc::now(),
            value_eth: "1.5".to_string(),
            gas: 21_000,
            gas_price: "1000000000".to_string(),
            gas_used: Some(21_000),
            status: Some(1),
            nonce: 7,
            input_data: "0x".to_string(),
            tx_type: 2,
            max_fee_per_gas: Some("2000000000".to_string()),
            max_priority_fee: Some("1000000000".to_string()),
        }
    }

    async fn count_transactions(store: &SqliteWhaleStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&store.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_tx_hash() {
        let store = setup_test_db().await;
        let matches = vec![sample_match("0x01", 100), sample_match("0x02", 100)];

        store.upsert_transactions(&matches).await.unwrap();
        assert_eq!(count_transactions(&store).await, 2);

        // Re-running the same range must not duplicate rows.
        store.upsert_transactions(&matches).await.unwrap();
        assert_eq!(count_transactions(&store).await, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = setup_test_db().await;
        store.upsert_transactions(&[sample_match("0x01", 100)]).await.unwrap();

        let mut updated = sample_match("0x01", 100);
        updated.value_eth = "3.5".to_string();
        store.upsert_transactions(&[updated]).await.unwrap();

        let value: String =
            sqlx::query_scalar("SELECT value_eth FROM transactions WHERE tx_hash = '0x01'")
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(value, "3.5");
    }

    #[tokio::test]
    async fn test_replace_whale_addresses_swaps_the_table() {
        let store = setup_test_db().await;

        store
            .replace_whale_addresses(vec![
                WhaleAddress::new("0xAA00000000000000000000000000000000000001", "One"),
                WhaleAddress::new("0xAA00000000000000000000000000000000000002", "Two"),
            ])
            .await
            .unwrap();
        assert_eq!(store.watched_addresses().await.unwrap().len(), 2);

        store
            .replace_whale_addresses(vec![WhaleAddress::new(
                "0xAA00000000000000000000000000000000000003",
                "Three",
            )])
            .await
            .unwrap();

        let whales = store.watched_addresses().await.unwrap();
        assert_eq!(whales.len(), 1);
        assert_eq!(whales[0].address, "0xaa00000000000000000000000000000000000003");
        assert_eq!(whales[0].label, "Three");
    }

    #[tokio::test]
    async fn test_retention_sweep_removes_only_old_rows() {
        let store = setup_test_db().await;

        let mut old = sample_match("0x01", 100);
        old.timestamp = Utc::now() - Duration::days(30);
        let fresh = sample_match("0x02", 101);

        store.upsert_transactions(&[old, fresh]).await.unwrap();

        let removed = store.delete_matches_older_than(14).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(count_transactions(&store).await, 1);

        let remaining: String = sqlx::query_scalar("SELECT tx_hash FROM transactions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(remaining, "0x02");
    }

    #[tokio::test]
    async fn test_empty_upsert_is_a_no_op() {
        let store = setup_test_db().await;
        store.upsert_transactions(&[]).await.unwrap();
        assert_eq!(count_transactions(&store).await, 0);
    }
}
