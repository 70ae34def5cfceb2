//! Core data structures shared across the ingestion pipeline.

pub mod block;
pub mod log;
pub mod stats;
pub mod transaction;
pub mod whale;

pub use block::Block;
pub use log::Log;
pub use stats::RunStats;
pub use transaction::{Receipt, Transaction, TxStatus, TX_TYPE_UNKNOWN};
pub use whale::{TransferDirection, WatchList, WhaleAddress, WhaleMatch};
