//! Fetches an inclusive block range through a bounded pool of concurrent
//! tasks, folding per-block statistics in a single consumer.

use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::normalizer::BlockNormalizer;
use crate::{
    models::{Block, RunStats},
    providers::{ChainDataSource, RpcClientError},
};

/// Fetches and enriches a range of blocks with bounded concurrency.
///
/// Output order is completion order, not block order. Callers needing the
/// highest fetched block must take the maximum block number, never the last
/// element.
pub struct RangeFetcher<D: ChainDataSource + ?Sized> {
    source: Arc<D>,
    normalizer: BlockNormalizer,
    workers: usize,
    cancel: CancellationToken,
}

impl<D: ChainDataSource + ?Sized> RangeFetcher<D> {
    /// Creates a new `RangeFetcher`.
    pub fn new(
        source: Arc<D>,
        normalizer: BlockNormalizer,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self { source, normalizer, workers, cancel }
    }

    /// Fetches blocks `start..=end`. A failing block is dropped and counted;
    /// the rest of the range is still returned. Cancellation stops feeding
    /// new block numbers while in-flight fetches drain.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn fetch_range(&self, start: u64, end: u64) -> (Vec<Block>, RunStats) {
        let started = Instant::now();
        let mut stats = RunStats::default();

        if start > end {
            return (Vec::new(), stats);
        }

        let cancel = &self.cancel;
        let outcomes = futures::stream::iter(start..=end)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|number| self.fetch_one(number))
            .buffer_unordered(self.workers.max(1));
        tokio::pin!(outcomes);

        let mut blocks = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(block) => {
                    stats.blocks_parsed += 1;
                    stats.transactions_parsed += block.transactions.len() as u64;
                    stats.logs_parsed += block.log_count();
                    stats.transactions_skipped += block.skipped_transactions;
                    blocks.push(block);
                }
                Err((number, RpcClientError::Cancelled)) => {
                    tracing::debug!(block_number = number, "Block fetch cancelled.");
                }
                Err((number, e)) => {
                    stats.errors_encountered += 1;
                    tracing::error!(
                        block_number = number,
                        error = %e,
                        "Failed to fetch block. Continuing with the rest of the range."
                    );
                }
            }
        }

        stats.duration = started.elapsed();
        (blocks, stats)
    }

    async fn fetch_one(&self, number: u64) -> Result<Block, (u64, RpcClientError)> {
        let mut block =
            self.source.block_by_number(number).await.map_err(|e| (number, e))?;
        self.normalizer.enrich(self.source.as_ref(), &mut block).await.map_err(|e| (number, e))?;
        Ok(block)
    }
}
