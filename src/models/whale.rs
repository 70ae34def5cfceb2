//! Watch-list and whale-match data structures.

use std::collections::HashMap;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The direction of a matched transfer relative to the watch-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Only the sender is watched.
    From,
    /// Only the recipient is watched.
    To,
    /// Both sender and recipient are watched.
    Internal,
}

impl TransferDirection {
    /// The short code persisted to the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::From => "FROM",
            TransferDirection::To => "TO",
            TransferDirection::Internal => "INT",
        }
    }
}

/// An injected mapping from lower-cased whale address to human label.
///
/// The filter never owns or hardcodes the list; it is supplied from
/// configuration (or the database) at call time.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    labels: HashMap<String, String>,
}

impl WatchList {
    /// Builds a watch list from an address-to-label mapping, lower-casing
    /// the keys.
    pub fn new(labels: HashMap<String, String>) -> Self {
        let labels =
            labels.into_iter().map(|(addr, label)| (addr.to_lowercase(), label)).collect();
        Self { labels }
    }

    /// Looks up the label for an address, case-insensitively.
    pub fn label_for(&self, address: &Address) -> Option<&str> {
        // Address's lower-hex Display already includes the 0x prefix.
        self.labels.get(&format!("{address:#x}")).map(String::as_str)
    }

    /// Looks up the label for a hex-string address, case-insensitively.
    pub fn label_for_hex(&self, address: &str) -> Option<&str> {
        self.labels.get(&address.to_lowercase()).map(String::as_str)
    }

    /// Returns `true` if the address is on the watch list.
    pub fn contains(&self, address: &Address) -> bool {
        self.label_for(address).is_some()
    }

    /// Number of watched addresses.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no addresses are watched.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(address, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(a, l)| (a.as_str(), l.as_str()))
    }
}

/// A watched address row as persisted in the `whale_addresses` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhaleAddress {
    /// Lower-cased hex address, unique key.
    pub address: String,
    /// Human-readable label, e.g. the exchange name.
    pub label: String,
    /// Whether the address participates in matching.
    pub is_watched: bool,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Row update time.
    pub updated_at: DateTime<Utc>,
}

impl WhaleAddress {
    /// Creates a watched address row with current timestamps.
    pub fn new(address: &str, label: &str) -> Self {
        let now = Utc::now();
        Self {
            address: address.to_lowercase(),
            label: label.to_string(),
            is_watched: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A transaction that matched the watch-list and value threshold, in the
/// shape persisted to the `transactions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleMatch {
    /// The transaction hash, used as the upsert key.
    pub tx_hash: String,
    /// Containing block number.
    pub block_number: u64,
    /// Containing block hash.
    pub block_hash: String,
    /// Index within the block.
    pub transaction_index: u64,
    /// Sender address, lower-cased hex, or `"unknown"` when unrecoverable.
    pub from_address: String,
    /// Recipient address, absent for contract creation.
    pub to_address: Option<String>,
    /// The matched whale address (sender for FROM, recipient otherwise).
    pub whale_address: String,
    /// The matched whale's label.
    pub whale_label: String,
    /// Direction of the transfer relative to the watch-list.
    pub direction: TransferDirection,
    /// Timestamp of the containing block.
    pub timestamp: DateTime<Utc>,
    /// The transfer value as a fixed-5-decimal ETH string.
    pub value_eth: String,
    /// Gas limit.
    pub gas: u64,
    /// Gas price in wei, decimal string.
    pub gas_price: String,
    /// Gas used, absent when the receipt was not fetched.
    pub gas_used: Option<u64>,
    /// Execution status: 1 success, 0 failed, absent when not fetched.
    pub status: Option<i64>,
    /// Sender nonce.
    pub nonce: u64,
    /// Hex-encoded input payload.
    pub input_data: String,
    /// Numeric wire-type discriminant.
    pub tx_type: u8,
    /// EIP-1559 max fee per gas, decimal string.
    pub max_fee_per_gas: Option<String>,
    /// EIP-1559 max priority fee per gas, decimal string.
    pub max_priority_fee: Option<String>,
}
