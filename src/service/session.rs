//! Wallet session lifecycle.
//!
//! The [`SessionManager`] is the only writer of the [`Session`]. It publishes
//! every change as a fresh `Arc<Session>` through a watch channel, so readers
//! see either the old session or the new one, never a mix of both.

use ethers::types::Address;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::blockchain::traits::{AccountSigner, LandRegistry, ProviderEvent, WalletProvider};
use crate::core::errors::LedgerError;
use crate::core::notify::Notifier;

pub const MSG_PROVIDER_MISSING: &str =
    "Wallet provider not found. Start a wallet node or fix the RPC endpoint.";
pub const MSG_NO_PROVIDER: &str = "No provider found";
pub const MSG_CONNECTED: &str = "Wallet connected";
pub const MSG_CONNECT_FAILED: &str = "Failed to connect wallet";
pub const MSG_DISCONNECTED: &str = "Please connect your wallet";
pub const MSG_ACCOUNT_SWITCHED: &str = "Account switched";

/// Signer, contract handle and account of a connected session. They exist
/// together or not at all.
#[derive(Clone)]
pub struct Connection {
    signer: Arc<dyn AccountSigner>,
    contract: Arc<dyn LandRegistry>,
    account: Address,
}

impl Connection {
    pub fn signer(&self) -> &Arc<dyn AccountSigner> {
        &self.signer
    }

    pub fn contract(&self) -> Arc<dyn LandRegistry> {
        self.contract.clone()
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("account", &self.account).finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct Session {
    provider: Option<Arc<dyn WalletProvider>>,
    connection: Option<Connection>,
}

impl Session {
    fn disconnected(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider, connection: None }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    pub fn account(&self) -> Option<Address> {
        self.connection.as_ref().map(|c| c.account)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("has_provider", &self.has_provider())
            .field("connection", &self.connection)
            .finish()
    }
}

/// Read-only view of the current session.
///
/// Call [`current`](Self::current) at the start of every operation; a snapshot
/// must not be kept across a suspension point.
#[derive(Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Arc<Session>>,
}

impl SessionReader {
    pub fn current(&self) -> Arc<Session> {
        self.rx.borrow().clone()
    }

    /// Waits for the next published session. Fails with
    /// [`LedgerError::SessionClosed`] once the manager is gone.
    pub async fn changed(&mut self) -> Result<Arc<Session>, LedgerError> {
        self.rx.changed().await.map_err(|_| LedgerError::SessionClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Listener registration. Disposing it deregisters the provider listeners.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("provider listeners deregistered");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct SessionState {
    tx: watch::Sender<Arc<Session>>,
    contract_address: Address,
    notifier: Notifier,
    reload: Notify,
}

impl SessionState {
    fn publish(&self, session: Session) {
        self.tx.send_replace(Arc::new(session));
    }

    async fn build_connection(
        &self,
        provider: &Arc<dyn WalletProvider>,
    ) -> Result<Connection, LedgerError> {
        let signer = provider
            .get_signer()
            .await
            .map_err(|f| LedgerError::ConnectionError(f.operator_message("signer unavailable")))?;
        let account = signer.address();
        let contract = signer.bind_registry(self.contract_address);
        Ok(Connection { signer, contract, account })
    }

    async fn on_accounts_changed(&self, provider: &Arc<dyn WalletProvider>, accounts: Vec<Address>) {
        if accounts.is_empty() {
            info!("Wallet revoked account access");
            self.publish(Session::disconnected(Some(provider.clone())));
            self.notifier.warning(MSG_DISCONNECTED);
            return;
        }
        match self.build_connection(provider).await {
            Ok(connection) => {
                info!(account = ?connection.account, "Active account switched");
                self.publish(Session { provider: Some(provider.clone()), connection: Some(connection) });
                self.notifier.info(MSG_ACCOUNT_SWITCHED);
            }
            Err(e) => {
                warn!(error = %e, "Could not rebuild session for new account");
                self.publish(Session::disconnected(Some(provider.clone())));
                self.notifier.error(format!("{}: {}", MSG_CONNECT_FAILED, e));
            }
        }
    }

    fn on_chain_changed(&self, provider: &Arc<dyn WalletProvider>, chain_id: u64) {
        info!(chain_id, "Network changed, reloading client");
        self.publish(Session::disconnected(Some(provider.clone())));
        self.reload.notify_one();
    }
}

/// Owns the wallet session and the provider listeners.
pub struct SessionManager {
    state: Arc<SessionState>,
    subscription: Option<Subscription>,
}

impl SessionManager {
    /// Starts the session. With no provider the session stays disconnected for
    /// the process lifetime and an error notification is emitted. With a
    /// provider, listeners are registered; account access is not requested.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(
        provider: Option<Arc<dyn WalletProvider>>,
        contract_address: Address,
        notifier: Notifier,
    ) -> Self {
        let (tx, _) = watch::channel(Arc::new(Session::disconnected(provider.clone())));
        let state = Arc::new(SessionState { tx, contract_address, notifier, reload: Notify::new() });

        let subscription = match provider {
            None => {
                warn!("No wallet provider detected; session stays disconnected");
                state.notifier.error(MSG_PROVIDER_MISSING);
                None
            }
            Some(provider) => {
                let events = provider.subscribe();
                let listener_state = state.clone();
                let handle = tokio::spawn(listen(listener_state, provider, events));
                Some(Subscription { handle: Some(handle) })
            }
        };

        Self { state, subscription }
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader { rx: self.state.tx.subscribe() }
    }

    pub fn current(&self) -> Arc<Session> {
        self.state.tx.borrow().clone()
    }

    pub fn contract_address(&self) -> Address {
        self.state.contract_address
    }

    /// Requests account access and publishes a fully connected session.
    pub async fn connect(&self) -> Result<Address, LedgerError> {
        let notifier = &self.state.notifier;
        let provider = match self.current().provider.clone() {
            Some(p) => p,
            None => {
                notifier.error(MSG_NO_PROVIDER);
                return Err(LedgerError::NoProvider);
            }
        };

        let result = async {
            let accounts = provider
                .request_accounts()
                .await
                .map_err(|f| LedgerError::ConnectionError(f.operator_message("request rejected")))?;
            if accounts.is_empty() {
                return Err(LedgerError::ConnectionError("no account authorized".into()));
            }
            self.state.build_connection(&provider).await
        }
        .await;

        match result {
            Ok(connection) => {
                let account = connection.account;
                info!(account = ?account, contract = ?self.state.contract_address, "Wallet connected");
                self.state.publish(Session { provider: Some(provider), connection: Some(connection) });
                notifier.success(MSG_CONNECTED);
                Ok(account)
            }
            Err(e) => {
                let reason = match &e {
                    LedgerError::ConnectionError(reason) => reason.clone(),
                    other => other.to_string(),
                };
                notifier.error(format!("{}: {}", MSG_CONNECT_FAILED, reason));
                Err(e)
            }
        }
    }

    /// Resolves once the provider reported a network change.
    pub async fn reload_requested(&self) {
        self.state.reload.notified().await;
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.as_ref().map_or(false, Subscription::is_active)
    }

    /// Deregisters the provider listeners. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn listen(
    state: Arc<SessionState>,
    provider: Arc<dyn WalletProvider>,
    mut events: broadcast::Receiver<ProviderEvent>,
) {
    loop {
        match events.recv().await {
            Ok(ProviderEvent::AccountsChanged(accounts)) => {
                state.on_accounts_changed(&provider, accounts).await
            }
            Ok(ProviderEvent::ChainChanged(chain_id)) => state.on_chain_changed(&provider, chain_id),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Provider events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Provider event stream closed");
                break;
            }
        }
    }
}
