#![warn(missing_docs)]
//! Whalewatch polls an Ethereum JSON-RPC endpoint for newly mined blocks and
//! records large transfers that touch a configured watch list of addresses.

pub mod config;
pub mod filtering;
pub mod ingest;
pub mod models;
pub mod persistence;
pub mod providers;
pub mod runner;
pub mod test_helpers;
pub mod watermark;
