// tests/util.rs
// Shared helpers for the integration tests: a scripted wallet wired into a
// session manager, plus notification draining.
#![allow(dead_code)]

use ethers::types::Address;
use std::sync::Arc;
use std::time::Duration;

use land_ledger::application::AppStore;
use land_ledger::blockchain::mock::{MockLandRegistry, MockWalletProvider};
use land_ledger::core::notify::{drain, Notification, NotificationReceiver, Notifier, Severity};
use land_ledger::service::{QueryService, SessionManager, TransactionOrchestrator};

pub fn contract() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn account(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub struct Harness {
    pub wallet: Arc<MockWalletProvider>,
    pub session: SessionManager,
    pub notifier: Notifier,
    pub notifications: NotificationReceiver,
}

impl Harness {
    /// Session with listeners registered but no account access yet.
    pub fn new(accounts: Vec<Address>) -> Self {
        let wallet = MockWalletProvider::new(accounts);
        let (notifier, notifications) = Notifier::channel();
        let session = SessionManager::initialize(Some(wallet.clone()), contract(), notifier.clone());
        Self { wallet, session, notifier, notifications }
    }

    /// Session connected to the first account; setup notifications are drained.
    pub async fn connected(accounts: Vec<Address>) -> Self {
        let mut harness = Self::new(accounts);
        harness.session.connect().await.expect("connect");
        harness.drain();
        harness
    }

    pub fn registry(&self) -> Arc<MockLandRegistry> {
        self.wallet.registry()
    }

    pub fn orchestrator(&self) -> TransactionOrchestrator {
        TransactionOrchestrator::new(self.session.reader(), self.notifier.clone())
    }

    pub fn queries(&self) -> QueryService {
        QueryService::new(self.session.reader(), self.notifier.clone())
    }

    pub fn store(&self) -> AppStore {
        AppStore::new(self.orchestrator(), self.queries(), self.notifier.clone())
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        drain(&mut self.notifications)
    }

    /// Lets the listener task process everything emitted so far.
    pub async fn settle(&self) {
        settle().await;
    }
}

pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
}

pub fn count(notifications: &[Notification], severity: Severity) -> usize {
    notifications.iter().filter(|n| n.severity == severity).count()
}
