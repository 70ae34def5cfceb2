//! Normalized transaction and receipt data structures.

use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::models::log::Log;

/// Transaction type discriminant for wire types newer than the decoder
/// understands.
pub const TX_TYPE_UNKNOWN: u8 = 255;

/// Execution status of a transaction, as derived from its receipt.
///
/// `NotFetched` is distinct from `Failed`: it means the receipt was never
/// requested (large-block policy) or was missing from the batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TxStatus {
    /// The transaction executed successfully.
    Success,
    /// The transaction was included but reverted.
    Failed,
    /// No receipt was fetched for this transaction.
    #[default]
    NotFetched,
}

/// A normalized Ethereum transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction hash, unique per chain.
    pub hash: B256,
    /// The number of the containing block.
    pub block_number: u64,
    /// The hash of the containing block.
    pub block_hash: B256,
    /// The transaction's index within its block.
    pub index: u64,
    /// The sender address. `None` when signature recovery failed; such a
    /// transaction never matches the watch-list.
    pub from: Option<Address>,
    /// The recipient address. `None` signals contract creation.
    pub to: Option<Address>,
    /// The transferred value in wei.
    pub value: U256,
    /// The gas limit.
    pub gas: u64,
    /// The gas price in wei.
    pub gas_price: u128,
    /// Gas consumed, 0 while the receipt has not been fetched.
    pub gas_used: u64,
    /// Receipt-derived execution status.
    pub status: TxStatus,
    /// The sender nonce.
    pub nonce: u64,
    /// The raw input payload.
    pub input: Bytes,
    /// Numeric wire-type discriminant (0 legacy, 1 access-list, 2 fee-market,
    /// 255 unknown).
    pub tx_type: u8,
    /// EIP-1559 max fee per gas, only meaningful for type-2 transactions.
    pub max_fee_per_gas: Option<u128>,
    /// EIP-1559 max priority fee per gas, only meaningful for type-2
    /// transactions.
    pub max_priority_fee_per_gas: Option<u128>,
    /// Address of the created contract, only ever set when `to` is `None`.
    pub contract_address: Option<Address>,
    /// Logs emitted by this transaction, when log collection is enabled.
    pub logs: Option<Vec<Log>>,
}

impl Transaction {
    /// Returns `true` if the transaction creates a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Applies receipt-derived fields to this transaction.
    pub fn apply_receipt(&mut self, receipt: &Receipt, include_logs: bool) {
        self.gas_used = receipt.gas_used;
        self.status = receipt.status;
        if self.to.is_none() {
            self.contract_address = receipt.contract_address;
        }
        if include_logs && !receipt.logs.is_empty() {
            self.logs = Some(receipt.logs.clone());
        }
    }
}

/// The receipt fields the pipeline cares about, normalized from the RPC
/// representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Execution outcome.
    pub status: TxStatus,
    /// Address of the created contract, for contract-creation transactions.
    pub contract_address: Option<Address>,
    /// Logs emitted during execution.
    pub logs: Vec<Log>,
}
