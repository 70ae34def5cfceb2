//! Conversions from RPC wire representations into the normalized models,
//! including the lenient raw-JSON path used when typed decoding fails.

use alloy::{
    consensus::{Transaction as ConsensusTransaction, TxReceipt},
    primitives::{Address, B256, Bytes, U256},
    rpc::types::{Block as RpcBlock, Transaction as RpcTransaction, TransactionReceipt},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Block, Log, Receipt, Transaction, TxStatus, TX_TYPE_UNKNOWN};

/// Converts a fully typed RPC block into the normalized model. Receipt-derived
/// fields are left unset.
pub fn block_from_rpc(block: RpcBlock<RpcTransaction>) -> Block {
    let number = block.header.number;
    let hash = block.header.hash;

    let mut out = Block {
        number,
        hash,
        parent_hash: block.header.parent_hash,
        timestamp: timestamp_utc(block.header.timestamp),
        miner: block.header.beneficiary,
        gas_limit: block.header.gas_limit,
        gas_used: block.header.gas_used,
        base_fee_per_gas: block.header.base_fee_per_gas,
        transactions: Vec::new(),
        skipped_transactions: 0,
    };
    out.transactions = block
        .transactions
        .into_transactions()
        .map(|tx| transaction_from_rpc(tx, number, hash))
        .collect();
    out
}

/// Converts a typed RPC transaction into the normalized model.
pub fn transaction_from_rpc(
    tx: RpcTransaction,
    block_number: u64,
    block_hash: B256,
) -> Transaction {
    let tx_type = tx.inner.tx_type() as u8;
    let (max_fee_per_gas, max_priority_fee_per_gas) = if tx_type >= 2 {
        (Some(tx.inner.max_fee_per_gas()), tx.inner.max_priority_fee_per_gas())
    } else {
        (None, None)
    };

    Transaction {
        hash: *tx.inner.hash(),
        block_number: tx.block_number.unwrap_or(block_number),
        block_hash: tx.block_hash.unwrap_or(block_hash),
        index: tx.transaction_index.unwrap_or_default(),
        from: Some(tx.inner.signer()),
        to: tx.inner.to(),
        value: tx.inner.value(),
        gas: tx.inner.gas_limit(),
        gas_price: tx.effective_gas_price.or_else(|| tx.inner.gas_price()).unwrap_or_default(),
        gas_used: 0,
        status: TxStatus::NotFetched,
        nonce: tx.inner.nonce(),
        input: tx.inner.input().clone(),
        tx_type,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        contract_address: None,
        logs: None,
    }
}

/// Extracts the receipt fields the pipeline uses from the RPC representation.
pub fn receipt_from_rpc(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        gas_used: receipt.gas_used,
        status: if receipt.status() { TxStatus::Success } else { TxStatus::Failed },
        contract_address: receipt.contract_address,
        logs: receipt.inner.logs().iter().map(Log::from).collect(),
    }
}

/// The header fields the lenient decoder reads. Every field is optional so a
/// partially malformed block still yields a usable record.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawHeader {
    number: Option<String>,
    hash: Option<String>,
    parent_hash: Option<String>,
    timestamp: Option<String>,
    miner: Option<String>,
    gas_limit: Option<String>,
    gas_used: Option<String>,
    base_fee_per_gas: Option<String>,
    transactions: Vec<Value>,
}

/// The minimal legacy-shaped transaction record extracted when a transaction
/// defeats the typed decoder.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTransaction {
    hash: Option<String>,
    from: Option<String>,
    to: Option<String>,
    value: Option<String>,
    gas: Option<String>,
    gas_price: Option<String>,
    nonce: Option<String>,
    input: Option<String>,
    transaction_index: Option<String>,
}

/// Decodes a raw JSON block leniently, defaulting every unparseable header
/// field and dropping (while counting) transactions that cannot produce even
/// a minimal record.
///
/// A header that does not parse at all yields a block carrying the requested
/// number and no transactions.
pub fn block_from_raw(requested: u64, raw: &Value) -> Block {
    let header: RawHeader = match serde_json::from_value(raw.clone()) {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!(
                block_number = requested,
                error = %e,
                "Raw block header did not parse. Returning an empty block."
            );
            return Block { number: requested, ..Block::default() };
        }
    };

    let number = header.number.as_deref().and_then(hex_u64).unwrap_or(requested);
    let hash = header.hash.as_deref().and_then(parse_b256).unwrap_or_default();

    let mut block = Block {
        number,
        hash,
        parent_hash: header.parent_hash.as_deref().and_then(parse_b256).unwrap_or_default(),
        timestamp: timestamp_utc(header.timestamp.as_deref().and_then(hex_u64).unwrap_or_default()),
        miner: header.miner.as_deref().and_then(parse_address).unwrap_or_default(),
        gas_limit: header.gas_limit.as_deref().and_then(hex_u64).unwrap_or_default(),
        gas_used: header.gas_used.as_deref().and_then(hex_u64).unwrap_or_default(),
        base_fee_per_gas: header.base_fee_per_gas.as_deref().and_then(hex_u64),
        transactions: Vec::with_capacity(header.transactions.len()),
        skipped_transactions: 0,
    };

    for (position, raw_tx) in header.transactions.iter().enumerate() {
        match transaction_from_raw(raw_tx, position as u64, number, hash) {
            Some(tx) => block.transactions.push(tx),
            None => {
                block.skipped_transactions += 1;
                tracing::debug!(
                    block_number = number,
                    position,
                    "Dropping transaction that defeats both decoders."
                );
            }
        }
    }

    block
}

/// Decodes one transaction from the raw block: typed parse first, then the
/// minimal legacy-shaped record (`tx_type` 255). Returns `None` when not even
/// a hash can be extracted.
fn transaction_from_raw(
    raw: &Value,
    position: u64,
    block_number: u64,
    block_hash: B256,
) -> Option<Transaction> {
    if let Ok(tx) = serde_json::from_value::<RpcTransaction>(raw.clone()) {
        return Some(transaction_from_rpc(tx, block_number, block_hash));
    }

    let raw_tx: RawTransaction = serde_json::from_value(raw.clone()).ok()?;
    let hash = raw_tx.hash.as_deref().and_then(parse_b256)?;

    Some(Transaction {
        hash,
        block_number,
        block_hash,
        index: raw_tx.transaction_index.as_deref().and_then(hex_u64).unwrap_or(position),
        from: raw_tx.from.as_deref().and_then(parse_address),
        to: raw_tx.to.as_deref().and_then(parse_address),
        value: raw_tx.value.as_deref().and_then(hex_u256).unwrap_or_default(),
        gas: raw_tx.gas.as_deref().and_then(hex_u64).unwrap_or_default(),
        gas_price: raw_tx.gas_price.as_deref().and_then(hex_u128).unwrap_or_default(),
        nonce: raw_tx.nonce.as_deref().and_then(hex_u64).unwrap_or_default(),
        input: raw_tx.input.as_deref().and_then(parse_bytes).unwrap_or_default(),
        tx_type: TX_TYPE_UNKNOWN,
        ..Transaction::default()
    })
}

fn timestamp_utc(secs: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs as i64, 0).unwrap_or_default()
}

fn hex_u64(s: &str) -> Option<u64> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

fn hex_u128(s: &str) -> Option<u128> {
    u128::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

fn hex_u256(s: &str) -> Option<U256> {
    U256::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

fn parse_address(s: &str) -> Option<Address> {
    s.parse().ok()
}

fn parse_b256(s: &str) -> Option<B256> {
    s.parse().ok()
}

fn parse_bytes(s: &str) -> Option<Bytes> {
    s.parse().ok()
}
