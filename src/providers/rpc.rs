//! This module provides the EVM RPC client: request pacing, a retry loop
//! aware of rate-limit responses, and the raw-JSON fallback for blocks that
//! defeat typed decoding.

use std::future::Future;

use alloy::{
    primitives::TxHash,
    providers::{Provider, ProviderBuilder, layers::CallBatchLayer},
    transports::{RpcError, TransportError, http::reqwest::Url},
};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{
    decode,
    rate_limit::RateLimitGate,
    traits::{ChainDataSource, RpcClientError},
};
use crate::{
    config::RpcRetryConfig,
    models::{Block, Receipt},
};

/// Error message fragments that identify a rate-limited response.
const RATE_LIMIT_MARKERS: &[&str] = &["429", "too many requests", "rate limit", "exceeded"];

/// A `ChainDataSource` implementation backed by an EVM JSON-RPC endpoint.
pub struct EvmRpcClient<P> {
    provider: P,
    gate: RateLimitGate,
    retry: RpcRetryConfig,
    cancel: CancellationToken,
}

impl<P> EvmRpcClient<P>
where
    P: Provider,
{
    /// Creates a new `EvmRpcClient`.
    pub fn new(provider: P, retry: RpcRetryConfig, cancel: CancellationToken) -> Self {
        let gate = RateLimitGate::new(retry.min_request_interval);
        Self { provider, gate, retry, cancel }
    }

    /// Runs one request through the rate gate and the retry loop.
    ///
    /// Rate-limited responses back off exponentially; other transport errors
    /// wait linearly with the attempt number. Deserialization failures are
    /// deterministic and surface immediately so the caller can switch to the
    /// raw decode path.
    async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        op: F,
    ) -> Result<T, RpcClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Err(RpcClientError::Cancelled);
            }
            self.gate.acquire().await;

            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(RpcError::DeserError { err, .. }) => {
                    return Err(RpcClientError::Decode { operation, message: err.to_string() });
                }
                Err(e) => e,
            };

            if attempt >= self.retry.max_retries {
                return Err(RpcClientError::RetriesExhausted {
                    operation,
                    attempts: attempt + 1,
                    last_error: error.to_string(),
                });
            }

            let delay = if is_rate_limit_error(&error) {
                self.retry.backoff_for_attempt(attempt)
            } else {
                self.retry.backoff_base * (attempt + 1)
            };
            tracing::warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "RPC request failed. Retrying after backoff."
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => return Err(RpcClientError::Cancelled),
            }
            attempt += 1;
        }
    }

    /// Refetches a block as raw JSON and decodes it leniently.
    async fn block_by_number_raw(&self, number: u64) -> Result<Block, RpcClientError> {
        let client = self.provider.client();
        let params = (format!("0x{number:x}"), true);
        let raw: Value = self
            .execute_with_retry("eth_getBlockByNumber", || {
                client.request("eth_getBlockByNumber", params.clone())
            })
            .await?;
        if raw.is_null() {
            return Err(RpcClientError::BlockNotFound(number));
        }
        Ok(decode::block_from_raw(number, &raw))
    }
}

#[async_trait]
impl<P> ChainDataSource for EvmRpcClient<P>
where
    P: Provider + Send + Sync,
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn latest_block_number(&self) -> Result<u64, RpcClientError> {
        let provider = &self.provider;
        let number = self
            .execute_with_retry("eth_blockNumber", || provider.get_block_number())
            .await?;
        tracing::debug!(current_block = number, "Fetched current block number.");
        Ok(number)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn block_by_number(&self, number: u64) -> Result<Block, RpcClientError> {
        let provider = &self.provider;
        let typed = self
            .execute_with_retry("eth_getBlockByNumber", || async move {
                provider.get_block_by_number(number.into()).full().await
            })
            .await;

        match typed {
            Ok(Some(block)) => Ok(decode::block_from_rpc(block)),
            Ok(None) => Err(RpcClientError::BlockNotFound(number)),
            Err(RpcClientError::Decode { message, .. }) => {
                tracing::warn!(
                    block_number = number,
                    error = %message,
                    "Typed block decoding failed. Refetching as raw JSON."
                );
                self.block_by_number_raw(number).await
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, tx_hashes), fields(tx_count = tx_hashes.len()), level = "debug")]
    async fn receipts_batch(
        &self,
        tx_hashes: &[TxHash],
    ) -> Result<Vec<Option<Receipt>>, RpcClientError> {
        if tx_hashes.is_empty() {
            return Ok(Vec::new());
        }

        // The provider's CallBatchLayer coalesces these into one HTTP
        // request, so the whole batch passes the gate once per attempt.
        let provider = &self.provider;
        let receipts = self
            .execute_with_retry("eth_getTransactionReceipt", || async move {
                let futures = tx_hashes.iter().map(|&hash| provider.get_transaction_receipt(hash));
                futures::future::try_join_all(futures).await
            })
            .await?;

        Ok(receipts
            .into_iter()
            .map(|receipt| receipt.as_ref().map(decode::receipt_from_rpc))
            .collect())
    }
}

fn is_rate_limit_error(error: &TransportError) -> bool {
    let message = error.to_string().to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Creates a new provider for the given RPC URL with call batching enabled.
pub fn create_provider(url: Url) -> impl Provider + Clone {
    ProviderBuilder::new().layer(CallBatchLayer::new()).connect_http(url)
}
