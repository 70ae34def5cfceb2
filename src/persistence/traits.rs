//! This module defines the interface for persisting whale matches and the
//! watch-list.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::error::PersistenceError;
use crate::models::{WhaleAddress, WhaleMatch};

/// A trait for the durable store of whale matches and watched addresses.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WhaleStore: Send + Sync {
    /// Upserts matches keyed on transaction hash. Re-running a range must
    /// not produce duplicate rows.
    async fn upsert_transactions(&self, matches: &[WhaleMatch]) -> Result<(), PersistenceError>;

    /// Replaces the whole watched-address table in one transaction
    /// (delete-all, then batch insert).
    async fn replace_whale_addresses(
        &self,
        whales: Vec<WhaleAddress>,
    ) -> Result<(), PersistenceError>;

    /// Returns every address currently marked as watched.
    async fn watched_addresses(&self) -> Result<Vec<WhaleAddress>, PersistenceError>;

    /// Deletes matches older than the given number of days. Returns the
    /// number of rows removed.
    async fn delete_matches_older_than(&self, days: u32) -> Result<u64, PersistenceError>;
}
