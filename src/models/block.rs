//! Normalized block data structures.

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::transaction::Transaction;

/// A normalized Ethereum block together with its (already decoded)
/// transactions.
///
/// Constructed by the RPC client, enriched with receipt data by the
/// normalizer, and then immutable. Transaction order is on-chain index order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    /// The chain-assigned block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: DateTime<Utc>,
    /// The address of the block producer.
    pub miner: Address,
    /// The block gas limit.
    pub gas_limit: u64,
    /// The total gas used by the block.
    pub gas_used: u64,
    /// The EIP-1559 base fee, absent on pre-fork blocks.
    pub base_fee_per_gas: Option<u64>,
    /// Transactions in on-chain index order.
    pub transactions: Vec<Transaction>,
    /// Transactions dropped by the fallback decoder because not even a
    /// minimal record could be extracted.
    pub skipped_transactions: u64,
}

impl Block {
    /// Total number of logs attached to this block's transactions.
    pub fn log_count(&self) -> u64 {
        self.transactions
            .iter()
            .filter_map(|tx| tx.logs.as_ref().map(|logs| logs.len() as u64))
            .sum()
    }
}
