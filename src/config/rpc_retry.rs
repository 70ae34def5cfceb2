use std::time::Duration;

use serde::Deserialize;

use super::helpers::deserialize_duration_from_ms;

/// Configuration for the RPC retry and rate limiting policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RpcRetryConfig {
    /// The maximum number of retries for a request.
    pub max_retries: u32,
    /// The initial backoff delay. Each retry doubles the previous delay.
    #[serde(deserialize_with = "deserialize_duration_from_ms")]
    pub backoff_base: Duration,
    /// The ceiling for the backoff delay.
    #[serde(deserialize_with = "deserialize_duration_from_ms")]
    pub backoff_max: Duration,
    /// The minimum interval between any two outgoing requests.
    #[serde(deserialize_with = "deserialize_duration_from_ms")]
    pub min_request_interval: Duration,
}

impl Default for RpcRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            min_request_interval: Duration::from_millis(500),
        }
    }
}

impl RpcRetryConfig {
    /// Returns the backoff delay for the given retry attempt, capped at
    /// `backoff_max`. Attempts are zero-indexed.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let shifted = self
            .backoff_base
            .checked_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .unwrap_or(self.backoff_max);
        shifted.min(self.backoff_max)
    }
}
