//! Run statistics accumulated by the range fetcher's collector.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counters for one fetch-filter-persist cycle.
///
/// A single collector folds per-block outcomes, so no shared lock is
/// involved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Blocks successfully fetched and normalized.
    pub blocks_parsed: u64,
    /// Transactions decoded across all fetched blocks.
    pub transactions_parsed: u64,
    /// Logs collected across all fetched blocks.
    pub logs_parsed: u64,
    /// Transactions the fallback decoder had to drop.
    pub transactions_skipped: u64,
    /// Per-block failures (fetch or normalize) absorbed by the range fetch.
    pub errors_encountered: u64,
    /// Wall-clock duration of the range fetch.
    #[serde(skip)]
    pub duration: Duration,
}
