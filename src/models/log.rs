//! Normalized event-log data structures.

use alloy::primitives::{Address, B256, Bytes};
use alloy::rpc::types::Log as AlloyLog;
use serde::{Deserialize, Serialize};

/// A normalized Ethereum event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// The address of the contract that emitted the log.
    pub address: Address,
    /// The log topics, in order.
    pub topics: Vec<B256>,
    /// The raw log data payload.
    pub data: Bytes,
    /// The number of the containing block.
    pub block_number: u64,
    /// The hash of the containing block.
    pub block_hash: B256,
    /// The hash of the emitting transaction.
    pub tx_hash: B256,
    /// The emitting transaction's index within the block.
    pub tx_index: u64,
    /// The log's index within the block.
    pub log_index: u64,
    /// Set when the log was removed by a chain reorganization.
    pub removed: bool,
}

impl From<&AlloyLog> for Log {
    fn from(log: &AlloyLog) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
            block_number: log.block_number.unwrap_or_default(),
            block_hash: log.block_hash.unwrap_or_default(),
            tx_hash: log.transaction_hash.unwrap_or_default(),
            tx_index: log.transaction_index.unwrap_or_default(),
            log_index: log.log_index.unwrap_or_default(),
            removed: log.removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_alloy_log_defaults_pending_positions() {
        let raw = AlloyLog::default();
        let log = Log::from(&raw);
        assert_eq!(log.block_number, 0);
        assert_eq!(log.log_index, 0);
        assert!(!log.removed);
        assert!(log.topics.is_empty());
    }

    #[test]
    fn from_alloy_log_carries_position_fields() {
        let raw = AlloyLog {
            block_number: Some(42),
            block_hash: Some(B256::repeat_byte(1)),
            transaction_hash: Some(B256::repeat_byte(2)),
            transaction_index: Some(3),
            log_index: Some(4),
            removed: true,
            ..Default::default()
        };
        let log = Log::from(&raw);
        assert_eq!(log.block_number, 42);
        assert_eq!(log.tx_index, 3);
        assert_eq!(log.log_index, 4);
        assert!(log.removed);
    }
}
