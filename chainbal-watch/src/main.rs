//! Multi-chain balance watcher.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (chainbal.toml in current directory)
//! cargo run -p chainbal-watch --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/watch.toml cargo run -p chainbal-watch
//!
//! # Configure logging level
//! RUST_LOG=chainbal=debug cargo run -p chainbal-watch
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `chainbal.toml`)
//! - `WATCH_ADDRESSES` - Comma-separated addresses to watch
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::collections::HashMap;
use std::sync::Arc;

use chainbal::aggregate::BalanceAggregator;
use chainbal::balance::BalanceItem;
use chainbal::client::ChainClient;
use chainbal_evm::AlloyEvmClient;
use chainbal_watch::{ShutdownSignal, WatchConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Watcher failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = WatchConfig::load()?;
    let (registry, chains) = config.registry()?;
    tracing::info!(
        addresses = config.addresses.len(),
        chains = chains.len(),
        registered = ?registry.chain_slugs().collect::<Vec<_>>(),
        assets = registry.asset_count(),
        "Loaded configuration"
    );

    if config.addresses.is_empty() {
        tracing::warn!("No addresses configured, every asset will report zero");
    }

    let mut clients = HashMap::new();
    for chain in &chains {
        if chain.substrate.is_some() {
            tracing::warn!(
                chain = %chain.slug,
                "No account-style transport bundled, skipping chain"
            );
            continue;
        }
        let Some(evm) = chain.evm else {
            continue;
        };
        let endpoints = config.endpoints_for(&chain.slug);
        if endpoints.is_empty() {
            tracing::warn!(chain = %chain.slug, "No RPC endpoints configured, skipping chain");
            continue;
        }
        let client = AlloyEvmClient::http(evm.chain_id, &endpoints)?;
        clients.insert(chain.slug.clone(), ChainClient::evm(Arc::new(client)));
    }

    let signal = ShutdownSignal::install()?;
    let aggregator = BalanceAggregator::new(registry).with_config(config.aggregator);
    let subscription =
        aggregator.subscribe(&config.addresses, &chains, &clients, |item: BalanceItem| {
            tracing::info!(
                token = %item.token_slug,
                state = ?item.state,
                free = %item.free,
                locked = %item.locked,
                "balance"
            );
        });

    tracing::info!(chains = clients.len(), "Watching balances");
    signal.recv().await;

    subscription.shutdown().await;
    tracing::info!("Watcher shut down gracefully");
    Ok(())
}
