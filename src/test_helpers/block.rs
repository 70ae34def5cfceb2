//! A builder for creating `Block` instances for testing.

use alloy::primitives::B256;
use chrono::{DateTime, Utc};

use crate::models::{Block, Transaction};

/// A builder for creating `Block` instances for testing.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    block: Block,
}

impl BlockBuilder {
    /// Creates a new `BlockBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block number.
    pub fn number(mut self, number: u64) -> Self {
        self.block.number = number;
        self
    }

    /// Sets the block hash.
    pub fn hash(mut self, hash: B256) -> Self {
        self.block.hash = hash;
        self
    }

    /// Sets the block timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.block.timestamp = timestamp;
        self
    }

    /// Adds a transaction to the block.
    pub fn transaction(mut self, tx: Transaction) -> Self {
        self.block.transactions.push(tx);
        self
    }

    /// Sets the number of transactions dropped during decoding.
    pub fn skipped_transactions(mut self, skipped: u64) -> Self {
        self.block.skipped_transactions = skipped;
        self
    }

    /// Builds the `Block` with the provided values.
    pub fn build(self) -> Block {
        self.block
    }
}
