//! Enriches decoded blocks with receipt-derived fields, subject to the
//! large-block policy.

use alloy::primitives::TxHash;

use crate::{
    config::AppConfig,
    providers::{ChainDataSource, RpcClientError},
};

use crate::models::Block;

/// Applies receipt data to a decoded block.
///
/// Blocks over the configured transaction-count limit are left in the
/// not-fetched state without a single receipt call.
pub struct BlockNormalizer {
    max_transactions_for_receipts: usize,
    skip_receipts_on_large_blocks: bool,
    include_logs: bool,
}

impl BlockNormalizer {
    /// Creates a new `BlockNormalizer` from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            max_transactions_for_receipts: config.max_transactions_for_receipts,
            skip_receipts_on_large_blocks: config.skip_receipts_on_large_blocks,
            include_logs: config.include_logs,
        }
    }

    /// Fetches receipts for the block's transactions in one batched
    /// round-trip and joins them back by index. A receipt missing from the
    /// response leaves that transaction's receipt-derived fields unset.
    #[tracing::instrument(skip(self, source, block), fields(block_number = block.number), level = "debug")]
    pub async fn enrich<D>(&self, source: &D, block: &mut Block) -> Result<(), RpcClientError>
    where
        D: ChainDataSource + ?Sized,
    {
        if block.transactions.is_empty() {
            return Ok(());
        }

        if self.skip_receipts_on_large_blocks
            && block.transactions.len() > self.max_transactions_for_receipts
        {
            tracing::info!(
                block_number = block.number,
                tx_count = block.transactions.len(),
                limit = self.max_transactions_for_receipts,
                "Large block. Skipping receipt fetch."
            );
            return Ok(());
        }

        let tx_hashes: Vec<TxHash> = block.transactions.iter().map(|tx| tx.hash).collect();
        let receipts = source.receipts_batch(&tx_hashes).await?;

        for (tx, receipt) in block.transactions.iter_mut().zip(receipts) {
            match receipt {
                Some(receipt) => tx.apply_receipt(&receipt, self.include_logs),
                None => {
                    tracing::debug!(
                        block_number = block.number,
                        tx_hash = %tx.hash,
                        "No receipt in batch response. Leaving transaction unenriched."
                    );
                }
            }
        }

        Ok(())
    }
}
