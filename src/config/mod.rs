//! Configuration module for the whale watcher.

mod app_config;
mod helpers;
mod rpc_retry;

pub use app_config::AppConfig;
pub use rpc_retry::RpcRetryConfig;
