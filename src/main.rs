use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use whalewatch::{
    config::AppConfig,
    persistence::SqliteWhaleStore,
    providers::rpc::{EvmRpcClient, create_provider},
    runner::Runner,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing app.yaml.
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetches new blocks and records whale transactions.
    Run,
    /// Replaces the stored whale table with the configured watch list.
    InitWhales,
}

#[tokio::main]
#[tracing::instrument(level = "info")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    tracing::debug!("Loading application configuration...");
    let config = Arc::new(AppConfig::new(cli.config_dir.as_deref())?);
    tracing::debug!(database_url = %config.database_url, network = %config.network, "Configuration loaded.");

    tracing::debug!("Initializing whale store...");
    let store = Arc::new(SqliteWhaleStore::new(&config.database_url).await?);
    store.run_migrations().await?;
    tracing::info!("Database migrations completed.");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received.");
                cancel.cancel();
            }
        });
    }

    let endpoint = config.endpoint_url()?;
    let provider = create_provider(endpoint);
    let client = Arc::new(EvmRpcClient::new(provider, config.rpc_retry.clone(), cancel.clone()));
    tracing::info!(retry_policy = ?config.rpc_retry, "EVM data source initialized.");

    let runner = Runner::new(config, client, store.clone(), cancel);
    match cli.command {
        Commands::Run => {
            let report = runner.run_cycle().await?;
            tracing::info!(matches = report.matches, "Run finished.");
        }
        Commands::InitWhales => {
            let count = runner.init_whales().await?;
            tracing::info!(count, "Whale table initialized.");
        }
    }

    store.close().await;
    Ok(())
}
