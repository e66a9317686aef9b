// src/main.rs
//! Land registry console entry point.
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use land_ledger::application::AppContext;
use land_ledger::blockchain::traits::{WalletControl, WalletProvider};
use land_ledger::blockchain::RpcWalletProvider;
use land_ledger::cli::Cli;
use land_ledger::console::{self, Exit};
use land_ledger::core::config::LedgerConfig;
use land_ledger::core::notify::Notifier;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    info!("Starting land-ledger v{}", env!("CARGO_PKG_VERSION"));

    let config = cli
        .load_config()
        .with_context(|| format!("Failed to load configuration from {}", cli.config_path().display()))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let (notifier, mut notifications) = Notifier::channel();
        let (provider, control) = discover_provider(&config).await;
        let mut ctx = AppContext::new(provider, control, &config, notifier)
            .context("Failed to build application context")?;

        let exit = console::run(&mut ctx, &mut notifications, &mut lines, &mut stdout).await?;
        ctx.shutdown();

        match exit {
            Exit::Quit => break,
            Exit::Reload => info!("Rebuilding application context after network change"),
        }
    }

    info!("land-ledger stopped");
    Ok(())
}

type ProviderHandles = (Option<Arc<dyn WalletProvider>>, Option<Arc<dyn WalletControl>>);

/// Probes the configured wallet endpoint once. Absence is not fatal: the
/// console runs disconnected and says so.
async fn discover_provider(config: &LedgerConfig) -> ProviderHandles {
    match RpcWalletProvider::discover(config).await {
        Ok(wallet) => {
            let wallet = Arc::new(wallet);
            let provider: Arc<dyn WalletProvider> = wallet.clone();
            let control: Arc<dyn WalletControl> = wallet;
            (Some(provider), Some(control))
        }
        Err(e) => {
            warn!(error = %e, rpc_url = %config.network.rpc_url, "Running without a wallet provider");
            (None, None)
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
