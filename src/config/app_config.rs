use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use super::RpcRetryConfig;

/// Networks for which an Infura endpoint can be derived from an API key.
const VALID_NETWORKS: &[&str] = &["mainnet", "sepolia", "holesky"];

/// Provides the default value for network.
fn default_network() -> String {
    "mainnet".to_string()
}

/// Provides the default value for csv_path.
fn default_csv_path() -> PathBuf {
    PathBuf::from("whale_transactions.csv")
}

/// Provides the default value for watermark_path.
fn default_watermark_path() -> PathBuf {
    PathBuf::from("last_block.dat")
}

/// Provides the default value for lock_path.
fn default_lock_path() -> PathBuf {
    PathBuf::from("whalewatch.lock")
}

/// Provides the default value for min_eth_value.
fn default_min_eth_value() -> u64 {
    1
}

/// Provides the default value for workers.
fn default_workers() -> usize {
    5
}

/// Provides the default value for max_block_delta.
fn default_max_block_delta() -> u64 {
    50
}

/// Provides the default value for max_transactions_for_receipts.
fn default_max_transactions_for_receipts() -> usize {
    100
}

/// Provides the default value for skip_receipts_on_large_blocks.
fn default_skip_receipts_on_large_blocks() -> bool {
    true
}

/// Provides the default value for retention_days.
fn default_retention_days() -> u32 {
    14
}

/// Provides the default value for explorer_tx_url.
fn default_explorer_tx_url() -> String {
    "https://etherscan.io/tx/".to_string()
}

/// Application configuration for the whale watcher.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Database URL for the SQLite database.
    pub database_url: String,

    /// Full RPC endpoint URL. Takes precedence over `api_key` + `network`.
    #[serde(default)]
    pub rpc_url: Option<Url>,

    /// Infura project API key, used to derive the endpoint when `rpc_url`
    /// is not set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Network name used when deriving an Infura endpoint.
    #[serde(default = "default_network")]
    pub network: String,

    /// Path to the append-only CSV report of whale transactions.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Path to the file holding the last processed block number.
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,

    /// Path to the lock file preventing concurrent runs.
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// Minimum transaction value in whole ETH for a transfer to be reported.
    #[serde(default = "default_min_eth_value")]
    pub min_eth_value: u64,

    /// Watched addresses mapped to their human-readable labels.
    #[serde(default)]
    pub watchlist: HashMap<String, String>,

    /// The number of concurrent block fetches.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// The maximum number of blocks to process in a single run.
    #[serde(default = "default_max_block_delta")]
    pub max_block_delta: u64,

    /// Blocks with more transactions than this are considered large.
    #[serde(default = "default_max_transactions_for_receipts")]
    pub max_transactions_for_receipts: usize,

    /// Whether to skip receipt fetching for large blocks.
    #[serde(default = "default_skip_receipts_on_large_blocks")]
    pub skip_receipts_on_large_blocks: bool,

    /// Whether to attach receipt logs to transactions.
    #[serde(default)]
    pub include_logs: bool,

    /// Stored matches older than this many days are deleted each run.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Base URL for transaction links in the CSV report.
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,

    /// Optional retry configuration.
    #[serde(default)]
    pub rpc_retry: RpcRetryConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("WHALEWATCH").separator("__"))
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validates that an RPC endpoint can be derived from the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.is_some() {
            return Ok(());
        }
        match &self.api_key {
            None => Err(ConfigError::Message(
                "either rpc_url or api_key must be set".to_string(),
            )),
            Some(key) if key.is_empty() => {
                Err(ConfigError::Message("api_key must not be empty".to_string()))
            }
            Some(_) => {
                if VALID_NETWORKS.contains(&self.network.as_str()) {
                    Ok(())
                } else {
                    Err(ConfigError::Message(format!(
                        "unsupported network '{}', expected one of: {}",
                        self.network,
                        VALID_NETWORKS.join(", ")
                    )))
                }
            }
        }
    }

    /// Returns the RPC endpoint URL, deriving the Infura endpoint from the
    /// API key when no explicit URL is configured.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Message("either rpc_url or api_key must be set".to_string()))?;
        Url::parse(&format!("https://{}.infura.io/v3/{}", self.network, key))
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            config: AppConfig {
                network: default_network(),
                csv_path: default_csv_path(),
                watermark_path: default_watermark_path(),
                lock_path: default_lock_path(),
                min_eth_value: default_min_eth_value(),
                workers: default_workers(),
                max_block_delta: default_max_block_delta(),
                max_transactions_for_receipts: default_max_transactions_for_receipts(),
                skip_receipts_on_large_blocks: default_skip_receipts_on_large_blocks(),
                retention_days: default_retention_days(),
                explorer_tx_url: default_explorer_tx_url(),
                ..AppConfig::default()
            },
        }
    }
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn rpc_url(mut self, rpc_url: Url) -> Self {
        self.config.rpc_url = Some(rpc_url);
        self
    }

    pub fn api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = Some(api_key.to_string());
        self
    }

    pub fn network(mut self, network: &str) -> Self {
        self.config.network = network.to_string();
        self
    }

    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    pub fn csv_path(mut self, path: &str) -> Self {
        self.config.csv_path = path.into();
        self
    }

    pub fn watermark_path(mut self, path: &str) -> Self {
        self.config.watermark_path = path.into();
        self
    }

    pub fn lock_path(mut self, path: &str) -> Self {
        self.config.lock_path = path.into();
        self
    }

    pub fn min_eth_value(mut self, value: u64) -> Self {
        self.config.min_eth_value = value;
        self
    }

    pub fn watchlist(mut self, watchlist: HashMap<String, String>) -> Self {
        self.config.watchlist = watchlist;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn max_block_delta(mut self, delta: u64) -> Self {
        self.config.max_block_delta = delta;
        self
    }

    pub fn max_transactions_for_receipts(mut self, limit: usize) -> Self {
        self.config.max_transactions_for_receipts = limit;
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.config.retention_days = days;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
