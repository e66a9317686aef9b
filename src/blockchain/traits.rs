use async_trait::async_trait;
use ethers::types::Address;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::core::domain::LandDetails;

/// Push notification from the wallet provider, delivered without request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The active account list changed. Empty means the wallet revoked access.
    AccountsChanged(Vec<Address>),
    /// The provider switched to another chain.
    ChainChanged(u64),
}

/// Failure reported by the remote side, normalized for message selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFailure {
    /// Structured reason (decoded revert string or JSON-RPC error message).
    pub reason: Option<String>,
    /// Generic top-level error text.
    pub message: Option<String>,
}

impl RemoteFailure {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self { reason: Some(reason.into()), message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self { reason: None, message: Some(message.into()) }
    }

    /// Structured reason, else generic message, else `fallback`.
    pub fn operator_message(&self, fallback: &str) -> String {
        let non_blank = |s: &&String| !s.trim().is_empty();
        self.reason
            .as_ref()
            .filter(non_blank)
            .or(self.message.as_ref().filter(non_blank))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reason, &self.message) {
            (Some(r), Some(m)) => write!(f, "{} ({})", r, m),
            (Some(r), None) => f.write_str(r),
            (None, Some(m)) => f.write_str(m),
            (None, None) => f.write_str("unknown remote failure"),
        }
    }
}

/// Account-holding provider the operator signs with.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the provider for account access. The active account comes first.
    async fn request_accounts(&self) -> Result<Vec<Address>, RemoteFailure>;

    /// Returns a signer bound to the currently active account.
    async fn get_signer(&self) -> Result<Arc<dyn AccountSigner>, RemoteFailure>;

    /// Registers a listener for provider-originated events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Operator actions performed "inside the wallet" rather than in the client.
#[async_trait]
pub trait WalletControl: Send + Sync {
    /// Makes `account` the active account.
    async fn switch_account(&self, account: Address) -> Result<(), RemoteFailure>;

    /// Revokes account access.
    fn lock(&self);
}

/// Capability bound to one account.
pub trait AccountSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Builds a contract handle that authorizes calls with this signer.
    fn bind_registry(&self, contract: Address) -> Arc<dyn LandRegistry>;
}

/// The deployed land registry contract.
#[async_trait]
pub trait LandRegistry: Send + Sync {
    async fn register_land(
        &self,
        land_id: &str,
        owner_name: &str,
        owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure>;

    /// Read-only; no transaction is created.
    async fn get_land_details(&self, land_id: &str) -> Result<LandDetails, RemoteFailure>;

    async fn transfer_land(
        &self,
        land_id: &str,
        new_owner: Address,
        new_owner_name: &str,
        new_owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure>;
}

/// A submitted, not yet confirmed state change.
#[async_trait]
pub trait TransactionHandle: Send + Sync {
    fn tx_hash(&self) -> String;

    async fn await_confirmation(&self) -> Result<(), RemoteFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_message_prefers_reason() {
        let failure = RemoteFailure {
            reason: Some("Land already registered".into()),
            message: Some("execution reverted".into()),
        };
        assert_eq!(failure.operator_message("Transaction failed"), "Land already registered");
    }

    #[test]
    fn operator_message_falls_back_to_message_then_fixed_text() {
        assert_eq!(
            RemoteFailure::with_message("user rejected").operator_message("Transfer failed"),
            "user rejected"
        );
        assert_eq!(RemoteFailure::default().operator_message("Transfer failed"), "Transfer failed");
    }

    #[test]
    fn blank_reason_is_ignored() {
        let failure = RemoteFailure { reason: Some("  ".into()), message: Some("timeout".into()) };
        assert_eq!(failure.operator_message("Transaction failed"), "timeout");
    }
}
