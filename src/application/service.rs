//! Application-level container wiring the session, the services and the store.

use std::sync::Arc;
use tracing::info;

use super::store::AppStore;
use crate::blockchain::traits::{WalletControl, WalletProvider};
use crate::core::config::LedgerConfig;
use crate::core::errors::LedgerError;
use crate::core::notify::Notifier;
use crate::service::{QueryService, SessionManager, TransactionOrchestrator};

/// One application lifetime. A network change drops the whole context and a
/// fresh one is built against the new chain.
pub struct AppContext {
    session: SessionManager,
    store: AppStore,
    control: Option<Arc<dyn WalletControl>>,
}

impl AppContext {
    /// Wires a context around an already discovered provider (or none).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        control: Option<Arc<dyn WalletControl>>,
        config: &LedgerConfig,
        notifier: Notifier,
    ) -> Result<Self, LedgerError> {
        let contract_address = config.contract_address()?;
        let session = SessionManager::initialize(provider, contract_address, notifier.clone());

        let mut transactions = TransactionOrchestrator::new(session.reader(), notifier.clone());
        if config.transactions.serialize_submissions {
            transactions = transactions.serialized();
        }
        let queries = QueryService::new(session.reader(), notifier.clone());
        let store = AppStore::new(transactions, queries, notifier);

        info!(contract = ?contract_address, "Application context ready");
        Ok(Self { session, store, control })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AppStore {
        &mut self.store
    }

    /// Operator-side wallet controls, if the provider exposes them.
    pub fn wallet_control(&self) -> Option<&Arc<dyn WalletControl>> {
        self.control.as_ref()
    }

    /// Deregisters provider listeners before the context is dropped.
    pub fn shutdown(mut self) {
        self.session.dispose();
    }
}
