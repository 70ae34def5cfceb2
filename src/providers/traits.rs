//! This module defines the interface for fetching data from an EVM-compatible
//! blockchain.

use alloy::primitives::TxHash;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::{Block, Receipt};

/// Custom error type for chain data source operations.
#[derive(Error, Debug)]
pub enum RpcClientError {
    /// Indicates that the requested block was not found.
    #[error("Block not found: {0}")]
    BlockNotFound(u64),

    /// The response payload could not be decoded into the expected shape.
    #[error("Failed to decode {operation} response: {message}")]
    Decode {
        /// The RPC method whose response failed to decode.
        operation: &'static str,
        /// The underlying decode failure.
        message: String,
    },

    /// The request kept failing after every allowed retry.
    #[error("Giving up on {operation} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// The RPC method that was retried.
        operation: &'static str,
        /// Total attempts made, including the first.
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
    },

    /// The operation was interrupted by a shutdown signal.
    #[error("Operation cancelled")]
    Cancelled,
}

/// A trait for a data source that can fetch blockchain data, normalized into
/// this crate's models.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Fetches the current block number from the data source.
    async fn latest_block_number(&self) -> Result<u64, RpcClientError>;

    /// Fetches a single block with its transactions. Receipt-derived fields
    /// are left unset; they are filled in by a separate receipt pass.
    async fn block_by_number(&self, number: u64) -> Result<Block, RpcClientError>;

    /// Fetches transaction receipts for the given hashes, in the same order.
    /// A missing receipt yields `None` at its position.
    async fn receipts_batch(
        &self,
        tx_hashes: &[TxHash],
    ) -> Result<Vec<Option<Receipt>>, RpcClientError>;
}
