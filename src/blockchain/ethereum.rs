use async_trait::async_trait;
use ethers::{
    prelude::JsonRpcClient,
    providers::{Http, Middleware, Provider},
    types::Address,
};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use super::contract::{provider_failure, EthersLandRegistry};
use super::traits::{
    AccountSigner, LandRegistry, ProviderEvent, RemoteFailure, WalletControl, WalletProvider,
};
use crate::core::config::LedgerConfig;
use crate::core::errors::LedgerError;

const EVENT_CAPACITY: usize = 64;

/// Wallet provider backed by a JSON-RPC node that holds unlocked accounts.
///
/// The node signs (`eth_sendTransaction` with `from`), so the client never
/// sees key material. The provider tracks which account is active the way a
/// browser wallet does and pushes [`ProviderEvent`]s when the account list or
/// the chain changes.
pub struct RpcWalletProvider<P: JsonRpcClient = Http> {
    inner: Arc<ProviderInner<P>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

struct ProviderInner<P: JsonRpcClient> {
    provider: Arc<Provider<P>>,
    chain_id: u64,
    confirmations: usize,
    state: Mutex<WalletState>,
    events: broadcast::Sender<ProviderEvent>,
}

#[derive(Debug, Default)]
struct WalletState {
    selected: Option<Address>,
    locked: bool,
    /// Account list the wallet last reported, by event or by request.
    /// `None` until the first report.
    reported: Option<Vec<Address>>,
}

impl WalletState {
    /// Active account first, the rest in node order.
    fn order(&mut self, mut accounts: Vec<Address>) -> Vec<Address> {
        if self.locked {
            return Vec::new();
        }
        let selected = match self.selected {
            Some(sel) if accounts.contains(&sel) => sel,
            _ => match accounts.first() {
                Some(first) => *first,
                None => {
                    self.selected = None;
                    return accounts;
                }
            },
        };
        self.selected = Some(selected);
        accounts.retain(|a| *a != selected);
        accounts.insert(0, selected);
        accounts
    }

    /// Records `accounts` as reported. True when a previous report differs.
    fn report(&mut self, accounts: &[Address]) -> bool {
        let changed = self.reported.as_deref().map_or(false, |prev| prev != accounts);
        self.reported = Some(accounts.to_vec());
        changed
    }
}

impl RpcWalletProvider<Http> {
    /// Probes the configured endpoint. Any failure is [`LedgerError::NoProvider`].
    pub async fn discover(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let rpc_url = config.network.rpc_url.trim();
        let parsed_url = reqwest::Url::parse(rpc_url).map_err(|e| {
            warn!(rpc_url = %rpc_url, error = %e, "Invalid wallet RPC URL");
            LedgerError::NoProvider
        })?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.network.request_timeout_secs));
        if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
            if let Ok(p) = reqwest::Proxy::all(proxy) {
                builder = builder.proxy(p);
            }
        }
        let client = builder.build().map_err(|e| {
            warn!(error = %e, "Failed to build HTTP client");
            LedgerError::NoProvider
        })?;

        let provider = Provider::new(Http::new_with_client(parsed_url.clone(), client));
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| {
                warn!(rpc_url = %parsed_url, error = %e, "Wallet provider unreachable");
                LedgerError::NoProvider
            })?
            .as_u64();

        info!(rpc_url = %parsed_url, chain_id, "Wallet provider detected");
        let wallet = Self::with_provider(provider, chain_id, config.transactions.confirmations);
        wallet.start_watcher(Duration::from_millis(config.provider.poll_interval_ms));
        Ok(wallet)
    }
}

impl<P: JsonRpcClient + 'static> RpcWalletProvider<P> {
    /// Wraps an existing provider without probing it. The watcher is not started.
    pub fn with_provider(provider: Provider<P>, chain_id: u64, confirmations: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ProviderInner {
                provider: Arc::new(provider),
                chain_id,
                confirmations,
                state: Mutex::new(WalletState::default()),
                events,
            }),
            watcher: Mutex::new(None),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }

    /// Starts polling the node for account and chain changes.
    pub fn start_watcher(&self, interval: Duration) {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.watch(interval).await });
        if let Some(previous) = self.watcher.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_watcher(&self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }
}

impl<P: JsonRpcClient + 'static> ProviderInner<P> {
    async fn node_accounts(&self) -> Result<Vec<Address>, RemoteFailure> {
        self.provider.get_accounts().await.map_err(|e| provider_failure(&e))
    }

    /// Orders the node's accounts and records them as reported.
    fn ordered(&self, accounts: Vec<Address>) -> Vec<Address> {
        let mut state = self.state.lock();
        let ordered = state.order(accounts);
        state.report(&ordered);
        ordered
    }

    fn emit(&self, event: ProviderEvent) {
        debug!(?event, listeners = self.events.receiver_count(), "provider event");
        // No listener is not an error: nobody has subscribed yet.
        let _ = self.events.send(event);
    }

    async fn watch(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_chain = self.chain_id;
        loop {
            ticker.tick().await;
            self.poll(&mut last_chain).await;
        }
    }

    /// One watcher tick. Account changes are compared against the last list
    /// the wallet reported, so changes made through [`WalletControl`] are not
    /// emitted a second time.
    async fn poll(&self, last_chain: &mut u64) {
        match self.provider.get_chainid().await {
            Ok(id) if id.as_u64() != *last_chain => {
                *last_chain = id.as_u64();
                info!(chain_id = *last_chain, "Chain changed");
                self.emit(ProviderEvent::ChainChanged(*last_chain));
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "chain id poll failed"),
        }

        match self.node_accounts().await {
            Ok(accounts) => {
                let changed = {
                    let mut state = self.state.lock();
                    let ordered = state.order(accounts);
                    state.report(&ordered).then_some(ordered)
                };
                if let Some(ordered) = changed {
                    self.emit(ProviderEvent::AccountsChanged(ordered));
                }
            }
            Err(e) => debug!(error = %e, "account poll failed"),
        }
    }
}

impl<P: JsonRpcClient> Drop for RpcWalletProvider<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.get_mut().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> WalletProvider for RpcWalletProvider<P> {
    async fn request_accounts(&self) -> Result<Vec<Address>, RemoteFailure> {
        let accounts = match self.inner.provider.request::<_, Vec<Address>>("eth_requestAccounts", ()).await {
            Ok(accounts) => accounts,
            Err(e) => {
                debug!(error = %e, "eth_requestAccounts unsupported, falling back to eth_accounts");
                self.inner.node_accounts().await?
            }
        };
        self.inner.state.lock().locked = false;
        Ok(self.inner.ordered(accounts))
    }

    async fn get_signer(&self) -> Result<Arc<dyn AccountSigner>, RemoteFailure> {
        let selected = {
            let state = self.inner.state.lock();
            if state.locked {
                return Err(RemoteFailure::with_reason("Wallet is locked"));
            }
            state.selected
        };
        let account = match selected {
            Some(account) => account,
            None => *self
                .inner
                .ordered(self.inner.node_accounts().await?)
                .first()
                .ok_or_else(|| RemoteFailure::with_reason("No account available"))?,
        };
        Ok(Arc::new(NodeSigner {
            provider: self.inner.provider.clone(),
            account,
            confirmations: self.inner.confirmations,
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.inner.events.subscribe()
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> WalletControl for RpcWalletProvider<P> {
    async fn switch_account(&self, account: Address) -> Result<(), RemoteFailure> {
        let accounts = self.inner.node_accounts().await?;
        if !accounts.contains(&account) {
            return Err(RemoteFailure::with_reason(format!(
                "Account {:?} is not managed by this wallet",
                account
            )));
        }
        let ordered = {
            let mut state = self.inner.state.lock();
            state.locked = false;
            state.selected = Some(account);
            let ordered = state.order(accounts);
            state.report(&ordered);
            ordered
        };
        info!(account = ?account, "Active account switched in wallet");
        self.inner.emit(ProviderEvent::AccountsChanged(ordered));
        Ok(())
    }

    fn lock(&self) {
        {
            let mut state = self.inner.state.lock();
            state.locked = true;
            state.selected = None;
            state.report(&[]);
        }
        info!("Wallet locked");
        self.inner.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }
}

/// Signer for a node-managed account.
pub struct NodeSigner<P: JsonRpcClient> {
    provider: Arc<Provider<P>>,
    account: Address,
    confirmations: usize,
}

impl<P: JsonRpcClient + 'static> AccountSigner for NodeSigner<P> {
    fn address(&self) -> Address {
        self.account
    }

    fn bind_registry(&self, contract: Address) -> Arc<dyn LandRegistry> {
        Arc::new(EthersLandRegistry::new(
            contract,
            self.provider.clone(),
            self.account,
            self.confirmations,
        ))
    }
}
