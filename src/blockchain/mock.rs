// Scripted in-memory wallet and registry used by the test suites.
use async_trait::async_trait;
use ethers::types::Address;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};

use super::traits::{
    AccountSigner, LandRegistry, ProviderEvent, RemoteFailure, TransactionHandle, WalletControl,
    WalletProvider,
};
use crate::core::domain::LandDetails;

/// A call that reached the registry, tagged with the signer that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register { from: Address, land_id: String, owner_name: String, owner_contact: String },
    Details { from: Address, land_id: String },
    Transfer {
        from: Address,
        land_id: String,
        new_owner: Address,
        new_owner_name: String,
        new_owner_contact: String,
    },
}

#[derive(Default)]
struct RegistryState {
    records: HashMap<String, LandDetails>,
    calls: Vec<RegistryCall>,
    fail_next_submit: Option<RemoteFailure>,
    fail_next_confirmation: Option<RemoteFailure>,
    fail_next_details: Option<RemoteFailure>,
    confirmation_gate: Option<Arc<Semaphore>>,
    tx_counter: u64,
}

/// In-memory land registry. Confirmed transactions mutate its records.
#[derive(Default)]
pub struct MockLandRegistry {
    state: Mutex<RegistryState>,
}

impl MockLandRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_record(&self, details: LandDetails) {
        self.state.lock().records.insert(details.0.clone(), details);
    }

    pub fn record(&self, land_id: &str) -> Option<LandDetails> {
        self.state.lock().records.get(land_id).cloned()
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.state.lock().calls.clone()
    }

    pub fn fail_next_submit(&self, failure: RemoteFailure) {
        self.state.lock().fail_next_submit = Some(failure);
    }

    pub fn fail_next_confirmation(&self, failure: RemoteFailure) {
        self.state.lock().fail_next_confirmation = Some(failure);
    }

    pub fn fail_next_details(&self, failure: RemoteFailure) {
        self.state.lock().fail_next_details = Some(failure);
    }

    /// Confirmations block until [`release_confirmations`](Self::release_confirmations).
    pub fn hold_confirmations(&self) {
        self.state.lock().confirmation_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_confirmations(&self) {
        if let Some(gate) = self.state.lock().confirmation_gate.take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    fn submit(
        registry: &Arc<Self>,
        call: RegistryCall,
        apply: ApplyFn,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        let mut state = registry.state.lock();
        state.calls.push(call);
        if let Some(failure) = state.fail_next_submit.take() {
            return Err(failure);
        }
        state.tx_counter += 1;
        Ok(Box::new(MockTransaction {
            registry: registry.clone(),
            tx_hash: format!("0x{:064x}", state.tx_counter),
            gate: state.confirmation_gate.clone(),
            apply: Mutex::new(Some(apply)),
        }))
    }
}

type ApplyFn = Box<dyn FnOnce(&mut HashMap<String, LandDetails>) + Send + Sync>;

pub struct MockTransaction {
    registry: Arc<MockLandRegistry>,
    tx_hash: String,
    gate: Option<Arc<Semaphore>>,
    apply: Mutex<Option<ApplyFn>>,
}

#[async_trait]
impl TransactionHandle for MockTransaction {
    fn tx_hash(&self) -> String {
        self.tx_hash.clone()
    }

    async fn await_confirmation(&self) -> Result<(), RemoteFailure> {
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|_| RemoteFailure::with_message("confirmation gate closed"))?;
        }
        let mut state = self.registry.state.lock();
        if let Some(failure) = state.fail_next_confirmation.take() {
            return Err(failure);
        }
        if let Some(apply) = self.apply.lock().take() {
            apply(&mut state.records);
        }
        Ok(())
    }
}

/// Registry handle bound to one signer account.
pub struct BoundMockRegistry {
    registry: Arc<MockLandRegistry>,
    from: Address,
}

#[async_trait]
impl LandRegistry for BoundMockRegistry {
    async fn register_land(
        &self,
        land_id: &str,
        owner_name: &str,
        owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        let details: LandDetails =
            (land_id.to_string(), owner_name.to_string(), owner_contact.to_string(), self.from, true);
        MockLandRegistry::submit(
            &self.registry,
            RegistryCall::Register {
                from: self.from,
                land_id: land_id.to_string(),
                owner_name: owner_name.to_string(),
                owner_contact: owner_contact.to_string(),
            },
            Box::new(move |records| {
                records.insert(details.0.clone(), details);
            }),
        )
    }

    async fn get_land_details(&self, land_id: &str) -> Result<LandDetails, RemoteFailure> {
        let mut state = self.registry.state.lock();
        state.calls.push(RegistryCall::Details { from: self.from, land_id: land_id.to_string() });
        if let Some(failure) = state.fail_next_details.take() {
            return Err(failure);
        }
        state.records.get(land_id).cloned().ok_or_else(|| RemoteFailure {
            reason: Some("Land not registered".into()),
            message: Some("execution reverted: Land not registered".into()),
        })
    }

    async fn transfer_land(
        &self,
        land_id: &str,
        new_owner: Address,
        new_owner_name: &str,
        new_owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        let (id, name, contact) =
            (land_id.to_string(), new_owner_name.to_string(), new_owner_contact.to_string());
        let applied = (id.clone(), name.clone(), contact.clone());
        MockLandRegistry::submit(
            &self.registry,
            RegistryCall::Transfer {
                from: self.from,
                land_id: id,
                new_owner,
                new_owner_name: name,
                new_owner_contact: contact,
            },
            Box::new(move |records| {
                let (id, name, contact) = applied;
                if let Some(entry) = records.get_mut(&id) {
                    entry.1 = name;
                    entry.2 = contact;
                    entry.3 = new_owner;
                }
            }),
        )
    }
}

pub struct MockSigner {
    account: Address,
    registry: Arc<MockLandRegistry>,
}

impl AccountSigner for MockSigner {
    fn address(&self) -> Address {
        self.account
    }

    fn bind_registry(&self, _contract: Address) -> Arc<dyn LandRegistry> {
        Arc::new(BoundMockRegistry { registry: self.registry.clone(), from: self.account })
    }
}

struct WalletState {
    accounts: Vec<Address>,
    reject_with: Option<RemoteFailure>,
}

/// Wallet double whose events are fired explicitly by the test.
pub struct MockWalletProvider {
    state: Mutex<WalletState>,
    events: broadcast::Sender<ProviderEvent>,
    registry: Arc<MockLandRegistry>,
}

impl MockWalletProvider {
    pub fn new(accounts: Vec<Address>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            state: Mutex::new(WalletState { accounts, reject_with: None }),
            events,
            registry: MockLandRegistry::new(),
        })
    }

    pub fn registry(&self) -> Arc<MockLandRegistry> {
        self.registry.clone()
    }

    /// Every following account request fails with `failure`.
    pub fn reject_requests(&self, failure: RemoteFailure) {
        self.state.lock().reject_with = Some(failure);
    }

    pub fn accept_requests(&self) {
        self.state.lock().reject_with = None;
    }

    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts.clone();
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    pub fn emit_chain_changed(&self, chain_id: u64) {
        let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
    }

    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, RemoteFailure> {
        let state = self.state.lock();
        match &state.reject_with {
            Some(failure) => Err(failure.clone()),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn get_signer(&self) -> Result<Arc<dyn AccountSigner>, RemoteFailure> {
        let account = self
            .state
            .lock()
            .accounts
            .first()
            .copied()
            .ok_or_else(|| RemoteFailure::with_reason("No account available"))?;
        Ok(Arc::new(MockSigner { account, registry: self.registry.clone() }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl WalletControl for MockWalletProvider {
    async fn switch_account(&self, account: Address) -> Result<(), RemoteFailure> {
        let mut accounts = self.state.lock().accounts.clone();
        accounts.retain(|a| *a != account);
        accounts.insert(0, account);
        self.emit_accounts_changed(accounts);
        Ok(())
    }

    fn lock(&self) {
        self.emit_accounts_changed(Vec::new());
    }
}
