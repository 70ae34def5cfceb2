//! The run coordinator: one lock-guarded fetch-filter-persist cycle per
//! invocation, plus the whale-table initialization command.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    filtering,
    ingest::{BlockNormalizer, RangeFetcher},
    models::{RunStats, WatchList, WhaleAddress},
    persistence::{CsvSink, PersistenceError, WhaleStore},
    providers::{ChainDataSource, RpcClientError},
    watermark::WatermarkStore,
};

/// Errors that terminate a run.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The exclusive lock file already exists.
    #[error("Another instance appears to be running (lock file {0} exists)")]
    AlreadyRunning(String),

    /// A chain data source operation failed beyond the fetcher's tolerance.
    #[error(transparent)]
    Rpc(#[from] RpcClientError),

    /// A sink operation failed. The watermark is left untouched.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A lock or watermark file operation failed.
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What a completed cycle did, for logging and assertions.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Fetch statistics for the processed range.
    pub stats: RunStats,
    /// Number of whale matches persisted.
    pub matches: usize,
    /// The watermark written, if any block was fetched.
    pub new_watermark: Option<u64>,
}

/// Removes the lock file when the run ends, however it ends.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: &Path) -> Result<Self, RunnerError> {
        match std::fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Self { path: path.to_path_buf() }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(RunnerError::AlreadyRunning(path.display().to_string()))
            }
            Err(e) => Err(RunnerError::Io(e)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove lock file.");
        }
    }
}

/// Coordinates one ingestion cycle end to end.
pub struct Runner<D: ChainDataSource + ?Sized, S: WhaleStore + ?Sized> {
    /// Shared application configuration.
    config: Arc<AppConfig>,
    /// The chain data source blocks are fetched from.
    source: Arc<D>,
    /// The durable store for whale matches.
    store: Arc<S>,
    /// A token used to signal a graceful shutdown.
    cancel: CancellationToken,
}

impl<D: ChainDataSource + ?Sized, S: WhaleStore + ?Sized> Runner<D, S> {
    /// Creates a new `Runner`.
    pub fn new(
        config: Arc<AppConfig>,
        source: Arc<D>,
        store: Arc<S>,
        cancel: CancellationToken,
    ) -> Self {
        Self { config, source, store, cancel }
    }

    /// Runs one cycle: read watermark, fetch the (clamped) new range, filter,
    /// persist to both sinks, sweep old rows, then advance the watermark to
    /// the highest block actually fetched.
    ///
    /// Any sink failure aborts before the watermark write, so the next run
    /// retries the same range; the upsert key makes the replay idempotent.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_cycle(&self) -> Result<CycleReport, RunnerError> {
        let _lock = LockGuard::acquire(&self.config.lock_path)?;

        let watch_list = WatchList::new(self.config.watchlist.clone());
        if watch_list.is_empty() {
            tracing::warn!("Watch list is empty. No transactions can match.");
        }

        let watermark = WatermarkStore::new(&self.config.watermark_path);
        let last_processed = watermark.read().await;
        let latest = self.source.latest_block_number().await?;

        let mut start = last_processed + 1;
        if latest.saturating_sub(last_processed) > self.config.max_block_delta {
            start = latest - self.config.max_block_delta;
            tracing::info!(
                last_processed,
                latest,
                start,
                "Gap exceeds the block delta. Clamping to the most recent window."
            );
        }
        if start > latest {
            tracing::info!(latest, "No new blocks to process.");
            return Ok(CycleReport::default());
        }

        tracing::info!(start, end = latest, "Processing block range.");
        let normalizer = BlockNormalizer::new(&self.config);
        let fetcher = RangeFetcher::new(
            self.source.clone(),
            normalizer,
            self.config.workers,
            self.cancel.clone(),
        );
        let (mut blocks, stats) = fetcher.fetch_range(start, latest).await;

        blocks.sort_unstable_by_key(|block| block.number);
        let matches = filtering::filter_whale_transactions(
            &blocks,
            &watch_list,
            self.config.min_eth_value,
        );

        self.store.upsert_transactions(&matches).await?;
        let csv = CsvSink::new(&self.config.csv_path);
        csv.append(&filtering::csv_lines(&matches, &watch_list, &self.config.explorer_tx_url))
            .await?;

        if self.config.retention_days > 0 {
            self.store.delete_matches_older_than(self.config.retention_days).await?;
        }

        // Completion order is arbitrary; the watermark takes the highest
        // block actually fetched.
        let new_watermark = blocks.iter().map(|block| block.number).max();
        if let Some(highest) = new_watermark {
            watermark.write(highest).await?;
        }

        tracing::info!(
            blocks = stats.blocks_parsed,
            transactions = stats.transactions_parsed,
            logs = stats.logs_parsed,
            skipped = stats.transactions_skipped,
            errors = stats.errors_encountered,
            matches = matches.len(),
            duration_ms = stats.duration.as_millis() as u64,
            "Run complete."
        );

        Ok(CycleReport { stats, matches: matches.len(), new_watermark })
    }

    /// Replaces the stored whale table with the configured watch list.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn init_whales(&self) -> Result<usize, RunnerError> {
        let whales: Vec<WhaleAddress> = self
            .config
            .watchlist
            .iter()
            .map(|(address, label)| WhaleAddress::new(address, label))
            .collect();
        let count = whales.len();
        if count == 0 {
            tracing::warn!("Configured watch list is empty. Clearing the whale table.");
        }
        self.store.replace_whale_addresses(whales).await?;
        tracing::info!(count, "Whale table initialized from configuration.");
        Ok(count)
    }
}
