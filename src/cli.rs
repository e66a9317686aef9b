use clap::Parser;
use std::path::{Path, PathBuf};

use crate::core::config::{LedgerConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use crate::core::errors::LedgerError;

/// Land registry console (library-facing definitions)
#[derive(Debug, Default, Parser)]
#[command(name = "land-ledger", about = "Land registry operator console", version)]
pub struct Cli {
    /// Configuration file (defaults to $CONFIG_PATH, then land-ledger.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Wallet provider JSON-RPC endpoint
    #[arg(long = "rpc-url")]
    pub rpc_url: Option<String>,
    /// Deployed LandRegistry contract address
    #[arg(long)]
    pub contract: Option<String>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => std::env::var(ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    /// File, then environment, then flags. The result is validated.
    pub fn load_config(&self) -> Result<LedgerConfig, LedgerError> {
        let mut config = LedgerConfig::load(Path::new(&self.config_path()))?;
        config.apply_env_overrides();
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut LedgerConfig) {
        if let Some(url) = &self.rpc_url {
            config.network.rpc_url = url.clone();
        }
        if let Some(address) = &self.contract {
            config.contract.address = address.clone();
        }
    }
}
