//! Whale filtering: value conversion, watch-list matching, and CSV
//! rendering of matches.

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    Block, Transaction, TransferDirection, TxStatus, WatchList, WhaleMatch,
};

/// Converts a wei amount to an ETH string rounded half-up to 5 decimal
/// places, with trailing zeros stripped ("1", "0.5", "1.33437").
pub fn wei_to_eth(wei: U256) -> String {
    // Decimal carries a 96-bit mantissa; anything past it saturates so a
    // threshold of any size still passes.
    let eth = i128::try_from(wei)
        .ok()
        .and_then(|value| Decimal::try_from_i128_with_scale(value, 18).ok())
        .unwrap_or(Decimal::MAX);
    eth.round_dp_with_strategy(5, RoundingStrategy::MidpointAwayFromZero).normalize().to_string()
}

/// Scans blocks for transactions touching the watch list with a rounded
/// value of at least `min_eth`. Blocks are scanned in the given order and
/// transactions in block order; at most one match per transaction.
///
/// The rounded value string is what gets compared against the threshold, so
/// a transfer of 0.999995 ETH passes a 1 ETH gate.
pub fn filter_whale_transactions(
    blocks: &[Block],
    watch_list: &WatchList,
    min_eth: u64,
) -> Vec<WhaleMatch> {
    if watch_list.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for block in blocks {
        for tx in &block.transactions {
            let from_watched = tx.from.map(|a| watch_list.contains(&a)).unwrap_or(false);
            let to_watched = tx.to.map(|a| watch_list.contains(&a)).unwrap_or(false);
            if !from_watched && !to_watched {
                continue;
            }

            let value_eth = wei_to_eth(tx.value);
            if value_eth.parse::<f64>().unwrap_or(0.0) < min_eth as f64 {
                continue;
            }

            let direction = match (from_watched, to_watched) {
                (true, true) => TransferDirection::Internal,
                (true, false) => TransferDirection::From,
                _ => TransferDirection::To,
            };

            matches.push(to_match(block, tx, direction, value_eth, watch_list));
        }
    }
    matches
}

fn to_match(
    block: &Block,
    tx: &Transaction,
    direction: TransferDirection,
    value_eth: String,
    watch_list: &WatchList,
) -> WhaleMatch {
    let from_address =
        tx.from.map(|a| format!("{a:#x}")).unwrap_or_else(|| "unknown".to_string());
    let to_address = tx.to.map(|a| format!("{a:#x}"));

    // FROM matches identify the sender; TO and INT matches the recipient.
    let whale_address = match direction {
        TransferDirection::From => from_address.clone(),
        TransferDirection::To | TransferDirection::Internal => {
            to_address.clone().unwrap_or_default()
        }
    };
    let whale_label = watch_list.label_for_hex(&whale_address).unwrap_or_default().to_string();

    let (gas_used, status) = match tx.status {
        TxStatus::Success => (Some(tx.gas_used), Some(1)),
        TxStatus::Failed => (Some(tx.gas_used), Some(0)),
        TxStatus::NotFetched => (None, None),
    };

    WhaleMatch {
        tx_hash: format!("{:#x}", tx.hash),
        block_number: block.number,
        block_hash: format!("{:#x}", tx.block_hash),
        transaction_index: tx.index,
        from_address,
        to_address,
        whale_address,
        whale_label,
        direction,
        timestamp: block.timestamp,
        value_eth,
        gas: tx.gas,
        gas_price: tx.gas_price.to_string(),
        gas_used,
        status,
        nonce: tx.nonce,
        input_data: tx.input.to_string(),
        tx_type: tx.tx_type,
        max_fee_per_gas: tx.max_fee_per_gas.map(|v| v.to_string()),
        max_priority_fee: tx.max_priority_fee_per_gas.map(|v| v.to_string()),
    }
}

/// Renders matches as CSV lines with 7 always-quoted fields:
/// explorer link, value, direction, whale address, label, UTC timestamp,
/// block number. An INT match emits both a FROM and a TO line.
pub fn csv_lines(matches: &[WhaleMatch], watch_list: &WatchList, explorer_tx_url: &str) -> String {
    let mut out = String::new();
    for m in matches {
        match m.direction {
            TransferDirection::From => {
                out.push_str(&csv_line(m, explorer_tx_url, "FROM", &m.whale_address, &m.whale_label));
            }
            TransferDirection::To => {
                out.push_str(&csv_line(m, explorer_tx_url, "TO", &m.whale_address, &m.whale_label));
            }
            TransferDirection::Internal => {
                let from_label = watch_list.label_for_hex(&m.from_address).unwrap_or_default();
                out.push_str(&csv_line(m, explorer_tx_url, "FROM", &m.from_address, from_label));
                out.push_str(&csv_line(m, explorer_tx_url, "TO", &m.whale_address, &m.whale_label));
            }
        }
    }
    out
}

fn csv_line(
    m: &WhaleMatch,
    explorer_tx_url: &str,
    direction: &str,
    address: &str,
    label: &str,
) -> String {
    format!(
        "\"{}{}\",\"{} ETH\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
        explorer_tx_url,
        m.tx_hash,
        m.value_eth,
        direction,
        csv_escape(address),
        csv_escape(label),
        m.timestamp.format("%Y-%m-%d %H:%M:%S"),
        m.block_number,
    )
}

fn csv_escape(field: &str) -> String {
    field.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::test_helpers::{BlockBuilder, TransactionBuilder};
    use alloy::primitives::{Address, B256};

    const ETH: u64 = 1_000_000_000_000_000_000;

    fn watch(addresses: &[(&str, &str)]) -> WatchList {
        let labels: HashMap<String, String> =
            addresses.iter().map(|(a, l)| (a.to_string(), l.to_string())).collect();
        WatchList::new(labels)
    }

    fn whale() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn whale_watch() -> WatchList {
        watch(&[("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "Test Whale")])
    }

    #[test]
    fn test_wei_to_eth_known_values() {
        assert_eq!(wei_to_eth(U256::from(ETH)), "1");
        assert_eq!(wei_to_eth(U256::from(ETH / 2)), "0.5");
        assert_eq!(wei_to_eth(U256::ZERO), "0");
        assert_eq!(wei_to_eth(U256::from(1_334_365_091_086_998_352u64)), "1.33437");
        assert_eq!(wei_to_eth(U256::from(133_436_509_108_699u64)), "0.00013");
        assert_eq!(wei_to_eth(U256::from(1_234_567_890_123_456_789u64)), "1.23457");
    }

    #[test]
    fn test_wei_to_eth_saturates_beyond_decimal_range() {
        // Past Decimal's 96-bit mantissa but still within i128.
        assert_eq!(wei_to_eth(U256::from(1u8) << 100), Decimal::MAX.to_string());
        assert_eq!(
            wei_to_eth(U256::from(10u64).pow(U256::from(30u64))),
            Decimal::MAX.to_string()
        );
        // Past i128 entirely.
        assert_eq!(wei_to_eth(U256::MAX), Decimal::MAX.to_string());
    }

    #[test]
    fn test_absurdly_large_transfer_still_matches() {
        let watch = whale_watch();
        let block = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .value(U256::from(10u64).pow(U256::from(30u64)))
                    .build(),
            )
            .build();

        assert_eq!(filter_whale_transactions(&[block], &watch, 1).len(), 1);
    }

    #[test]
    fn test_rounding_happens_before_threshold_compare() {
        let watch = whale_watch();
        // 0.999995 ETH rounds to "1" and passes a 1 ETH gate.
        let passing = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .value(U256::from(999_995_000_000_000_000u64))
                    .build(),
            )
            .build();
        assert_eq!(filter_whale_transactions(&[passing], &watch, 1).len(), 1);

        // 0.99999 ETH does not.
        let failing = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(2))
                    .from(whale())
                    .value(U256::from(999_990_000_000_000_000u64))
                    .build(),
            )
            .build();
        assert!(filter_whale_transactions(&[failing], &watch, 1).is_empty());
    }

    #[test]
    fn test_direction_classification() {
        let watch = whale_watch();
        let other = Address::repeat_byte(0xbb);

        let block = BlockBuilder::new()
            .number(5)
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .to(other)
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(2))
                    .from(other)
                    .to(whale())
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(3))
                    .from(whale())
                    .to(whale())
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(4))
                    .from(other)
                    .to(other)
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .build();

        let matches = filter_whale_transactions(&[block], &watch, 1);

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].direction, TransferDirection::From);
        assert_eq!(matches[0].whale_address, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(matches[1].direction, TransferDirection::To);
        assert_eq!(matches[1].whale_address, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(matches[2].direction, TransferDirection::Internal);
        assert_eq!(matches[2].whale_label, "Test Whale");
    }

    #[test]
    fn test_contract_creation_with_watched_sender_is_from_only() {
        let watch = whale_watch();
        let block = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .value(U256::from(3 * ETH))
                    .build(),
            )
            .build();

        let matches = filter_whale_transactions(&[block], &watch, 1);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, TransferDirection::From);
        assert!(matches[0].to_address.is_none());
    }

    #[test]
    fn test_unrecoverable_sender_never_matches() {
        let watch = whale_watch();
        let mut tx = TransactionBuilder::new()
            .hash(B256::repeat_byte(1))
            .value(U256::from(3 * ETH))
            .build();
        tx.from = None;
        let block = BlockBuilder::new().transaction(tx).build();

        assert!(filter_whale_transactions(&[block], &watch, 1).is_empty());
        assert_eq!(
            filter_whale_transactions(&[BlockBuilder::new().build()], &WatchList::default(), 1)
                .len(),
            0
        );
    }

    #[test]
    fn test_not_fetched_receipt_maps_to_absent_status() {
        let watch = whale_watch();
        let block = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .build();

        let matches = filter_whale_transactions(&[block], &watch, 1);

        assert!(matches[0].gas_used.is_none());
        assert!(matches[0].status.is_none());
    }

    #[test]
    fn test_csv_lines_have_seven_quoted_fields() {
        let watch = whale_watch();
        let block = BlockBuilder::new()
            .number(100)
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .to(Address::repeat_byte(0xbb))
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .build();
        let matches = filter_whale_transactions(&[block], &watch, 1);

        let csv = csv_lines(&matches, &watch, "https://etherscan.io/tx/");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);

        let fields: Vec<&str> = lines[0].split("\",\"").collect();
        assert_eq!(fields.len(), 7);
        assert!(fields[0].starts_with("\"https://etherscan.io/tx/0x"));
        assert_eq!(fields[1], "2 ETH");
        assert_eq!(fields[2], "FROM");
        assert_eq!(fields[4], "Test Whale");
        assert!(fields[6].ends_with("\""));
        assert!(fields[6].starts_with("100"));
    }

    #[test]
    fn test_internal_match_emits_from_and_to_lines() {
        let watch = whale_watch();
        let block = BlockBuilder::new()
            .transaction(
                TransactionBuilder::new()
                    .hash(B256::repeat_byte(1))
                    .from(whale())
                    .to(whale())
                    .value(U256::from(2 * ETH))
                    .build(),
            )
            .build();
        let matches = filter_whale_transactions(&[block], &watch, 1);
        assert_eq!(matches.len(), 1);

        let csv = csv_lines(&matches, &watch, "https://etherscan.io/tx/");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"FROM\""));
        assert!(lines[1].contains("\"TO\""));
    }
}
