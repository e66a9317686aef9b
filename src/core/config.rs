use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::core::errors::LedgerError;
use crate::core::validation::validate_ethereum_address;

pub const DEFAULT_CONFIG_PATH: &str = "land-ledger.toml";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_RPC_URL: &str = "LAND_LEDGER_RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "LAND_LEDGER_CONTRACT_ADDRESS";

/// Wallet endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "NetworkConfig::default_rpc_url")]
    pub rpc_url: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "NetworkConfig::default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl NetworkConfig {
    fn default_rpc_url() -> String { "http://127.0.0.1:8545".to_string() }
    fn default_request_timeout() -> u64 { 10 }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: Self::default_rpc_url(),
            request_timeout_secs: Self::default_request_timeout(),
        }
    }
}

/// Deployed registry contract. Fixed for the lifetime of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default = "ContractConfig::default_address")]
    pub address: String,
}

impl ContractConfig {
    fn default_address() -> String { "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string() }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self { address: Self::default_address() }
    }
}

/// Provider event watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Interval between account / chain polls (milliseconds)
    #[serde(default = "ProviderConfig::default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl ProviderConfig {
    fn default_poll_interval() -> u64 { 1000 }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { poll_interval_ms: Self::default_poll_interval() }
    }
}

/// Transaction submission configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Blocks to wait before a submission counts as confirmed
    #[serde(default = "TransactionConfig::default_confirmations")]
    pub confirmations: usize,

    /// Refuse a new submission while another one is pending
    #[serde(default)]
    pub serialize_submissions: bool,
}

impl TransactionConfig {
    fn default_confirmations() -> usize { 1 }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            confirmations: Self::default_confirmations(),
            serialize_submissions: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub transactions: TransactionConfig,
}

impl LedgerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LedgerError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!(path = %path.display(), "Loaded configuration");
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(LedgerError::ConfigError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Loads from `CONFIG_PATH` (or the default path) and applies env overrides.
    pub fn from_env() -> Result<Self, LedgerError> {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_RPC_URL) {
            self.network.rpc_url = url;
        }
        if let Ok(address) = std::env::var(ENV_CONTRACT_ADDRESS) {
            self.contract.address = address;
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.network.rpc_url.trim().is_empty() {
            return Err(LedgerError::ConfigError("network.rpc_url must not be empty".into()));
        }
        if self.transactions.confirmations == 0 {
            return Err(LedgerError::ConfigError(
                "transactions.confirmations must be at least 1".into(),
            ));
        }
        if self.provider.poll_interval_ms == 0 {
            return Err(LedgerError::ConfigError("provider.poll_interval_ms must be positive".into()));
        }
        self.contract_address().map(|_| ())
    }

    pub fn contract_address(&self) -> Result<Address, LedgerError> {
        validate_ethereum_address(self.contract.address.trim()).map_err(|e| {
            LedgerError::ConfigError(format!("Invalid contract address '{}': {}", self.contract.address, e))
        })
    }
}
