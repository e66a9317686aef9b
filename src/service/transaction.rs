//! Submit-then-confirm protocol for the state-mutating contract calls.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::session::{Connection, SessionReader};
use crate::blockchain::traits::{RemoteFailure, TransactionHandle};
use crate::core::domain::{LandRecord, RegisterForm, TransferRequest};
use crate::core::errors::LedgerError;
use crate::core::notify::Notifier;
use crate::core::validation::{require_fields, validate_ethereum_address};

pub const MSG_NOT_CONNECTED: &str = "Connect wallet first";
pub const MSG_BUSY: &str = "Another transaction is still pending";
pub const MSG_INVALID_NEW_OWNER: &str = "Invalid new owner address";

/// Which mutating call is being orchestrated. Selects the operator texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    Register,
    Transfer,
}

impl CallSite {
    pub fn fallback(self) -> &'static str {
        match self {
            CallSite::Register => "Transaction failed",
            CallSite::Transfer => "Transfer failed",
        }
    }

    pub fn submitted(self) -> &'static str {
        match self {
            CallSite::Register => "Transaction sent, waiting for confirmation...",
            CallSite::Transfer => "Transfer transaction sent...",
        }
    }

    pub fn confirmed(self) -> &'static str {
        match self {
            CallSite::Register => "Land registered",
            CallSite::Transfer => "Ownership transferred",
        }
    }

    pub fn missing_fields(self) -> &'static str {
        match self {
            CallSite::Register => "Fill all fields",
            CallSite::Transfer => "Fill all fields in transfer dialog",
        }
    }
}

/// Held for the duration of one submission when submissions are serialized.
struct InFlightToken {
    slot: Arc<AtomicBool>,
}

impl InFlightToken {
    fn acquire(slot: &Arc<AtomicBool>) -> Option<Self> {
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { slot: slot.clone() })
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

/// Clones share the session and, when serialized, the in-flight slot.
#[derive(Clone)]
pub struct TransactionOrchestrator {
    session: SessionReader,
    notifier: Notifier,
    in_flight: Option<Arc<AtomicBool>>,
}

impl TransactionOrchestrator {
    pub fn new(session: SessionReader, notifier: Notifier) -> Self {
        Self { session, notifier, in_flight: None }
    }

    /// Refuse a submission while another one is pending.
    pub fn serialized(mut self) -> Self {
        self.in_flight = Some(Arc::new(AtomicBool::new(false)));
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().map_or(false, |slot| slot.load(Ordering::Acquire))
    }

    /// Current connection, or a warning and [`LedgerError::NotConnected`].
    pub fn require_connection(&self) -> Result<Connection, LedgerError> {
        match self.session.current().connection() {
            Some(connection) => Ok(connection.clone()),
            None => {
                self.notifier.warning(MSG_NOT_CONNECTED);
                Err(LedgerError::NotConnected)
            }
        }
    }

    fn require_fields(&self, site: CallSite, fields: &[(&str, &str)]) -> Result<(), LedgerError> {
        require_fields(fields, site.missing_fields()).map_err(|e| {
            self.notifier.warning(site.missing_fields());
            e
        })
    }

    /// Sends `call`, reports submission, awaits confirmation and reports the
    /// outcome. Every failure yields exactly one error notification. Returns
    /// the transaction hash.
    pub async fn submit_and_confirm<Fut>(&self, site: CallSite, call: Fut) -> Result<String, LedgerError>
    where
        Fut: Future<Output = Result<Box<dyn TransactionHandle>, RemoteFailure>>,
    {
        let _token = match &self.in_flight {
            Some(slot) => match InFlightToken::acquire(slot) {
                Some(token) => Some(token),
                None => {
                    self.notifier.warning(MSG_BUSY);
                    return Err(LedgerError::Busy);
                }
            },
            None => None,
        };

        let handle = match call.await {
            Ok(handle) => handle,
            Err(failure) => {
                let message = failure.operator_message(site.fallback());
                warn!(?site, %failure, "Submission rejected");
                self.notifier.error(message.clone());
                return Err(LedgerError::RemoteCallError(message));
            }
        };

        let tx_hash = handle.tx_hash();
        info!(?site, tx_hash = %tx_hash, "Transaction submitted");
        self.notifier.info(site.submitted());

        if let Err(failure) = handle.await_confirmation().await {
            let message = failure.operator_message(site.fallback());
            warn!(?site, tx_hash = %tx_hash, %failure, "Transaction not confirmed");
            self.notifier.error(message.clone());
            return Err(LedgerError::ConfirmationError(message));
        }

        info!(?site, tx_hash = %tx_hash, "Transaction confirmed");
        self.notifier.success(site.confirmed());
        Ok(tx_hash)
    }

    /// Registers a parcel. On confirmation returns the record mirrored locally
    /// from the submitted inputs and the submitting account.
    #[instrument(skip_all, fields(land_id = %form.land_id.trim()))]
    pub async fn register(&self, form: &RegisterForm) -> Result<LandRecord, LedgerError> {
        let connection = self.require_connection()?;
        let input = form.trimmed();
        self.require_fields(
            CallSite::Register,
            &[
                ("landId", input.land_id.as_str()),
                ("ownerName", input.owner_name.as_str()),
                ("ownerContact", input.owner_contact.as_str()),
            ],
        )?;

        let contract = connection.contract();
        let call = contract.register_land(&input.land_id, &input.owner_name, &input.owner_contact);
        self.submit_and_confirm(CallSite::Register, call).await?;

        Ok(LandRecord::registered(&input, connection.account()))
    }

    /// Transfers a parcel to a new owner. The address is format-checked before
    /// anything is sent.
    #[instrument(skip_all, fields(land_id = %request.land_id.trim()))]
    pub async fn transfer(&self, request: &TransferRequest) -> Result<String, LedgerError> {
        let connection = self.require_connection()?;
        let input = request.trimmed();
        self.require_fields(
            CallSite::Transfer,
            &[
                ("landId", input.land_id.as_str()),
                ("newOwnerAddress", input.new_owner_address.as_str()),
                ("newOwnerName", input.new_owner_name.as_str()),
                ("newOwnerContact", input.new_owner_contact.as_str()),
            ],
        )?;

        let new_owner = validate_ethereum_address(&input.new_owner_address).map_err(|e| {
            self.notifier.error(MSG_INVALID_NEW_OWNER);
            e
        })?;

        let contract = connection.contract();
        let call = contract.transfer_land(
            &input.land_id,
            new_owner,
            &input.new_owner_name,
            &input.new_owner_contact,
        );
        self.submit_and_confirm(CallSite::Transfer, call).await
    }
}
