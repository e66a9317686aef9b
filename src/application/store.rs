//! UI-visible application state and its transition rules.

use futures::future::{FutureExt, LocalBoxFuture};
use std::str::FromStr;
use tracing::debug;

use crate::core::domain::{LandRecord, RegisterForm, TransferRequest, WorkflowSection};
use crate::core::errors::LedgerError;
use crate::core::notify::Notifier;
use crate::service::{QueryService, TransactionOrchestrator};

pub const MSG_LOAD_RECORD_FIRST: &str = "Load a registered land first";
pub const MSG_DIALOG_CLOSED: &str = "Open the transfer dialog first";

/// Editable field of the register / query form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    LandId,
    OwnerName,
    OwnerContact,
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "land-id" => Ok(FormField::LandId),
            "owner-name" => Ok(FormField::OwnerName),
            "owner-contact" => Ok(FormField::OwnerContact),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}

/// Editable field of the transfer dialog. The land id is not editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    NewOwnerAddress,
    NewOwnerName,
    NewOwnerContact,
}

impl FromStr for DialogField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(DialogField::NewOwnerAddress),
            "name" => Ok(DialogField::NewOwnerName),
            "contact" => Ok(DialogField::NewOwnerContact),
            other => Err(format!("unknown dialog field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub section: WorkflowSection,
    pub form: RegisterForm,
    pub displayed_record: Option<LandRecord>,
    /// Transfer dialog inputs; `Some` while the dialog is open.
    pub dialog: Option<TransferRequest>,
}

impl AppState {
    pub fn dialog_open(&self) -> bool {
        self.dialog.is_some()
    }
}

/// Remote part of a store operation. It borrows nothing from the store, so
/// the caller may keep changing state while it runs.
pub type PendingOperation = LocalBoxFuture<'static, Completion>;

/// Outcome of a [`PendingOperation`], applied with [`AppStore::complete`].
#[derive(Debug)]
pub enum Completion {
    Registered(Result<LandRecord, LedgerError>),
    Checked(Result<LandRecord, LedgerError>),
    Transferred(Result<String, LedgerError>),
}

pub struct AppStore {
    state: AppState,
    transactions: TransactionOrchestrator,
    queries: QueryService,
    notifier: Notifier,
}

impl AppStore {
    pub fn new(transactions: TransactionOrchestrator, queries: QueryService, notifier: Notifier) -> Self {
        Self { state: AppState::default(), transactions, queries, notifier }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn transactions(&self) -> &TransactionOrchestrator {
        &self.transactions
    }

    pub fn select_section(&mut self, section: WorkflowSection) {
        debug!(from = %self.state.section, to = %section, "section change");
        self.state.section = section;
        if section.clears_record() {
            self.state.displayed_record = None;
        }
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::LandId => self.state.form.land_id = value,
            FormField::OwnerName => self.state.form.owner_name = value,
            FormField::OwnerContact => self.state.form.owner_contact = value,
        }
    }

    /// Opens the dialog for the displayed record if it is registered.
    pub fn open_transfer_dialog(&mut self) -> bool {
        match &self.state.displayed_record {
            Some(record) if record.is_registered => {
                self.state.dialog = Some(TransferRequest::for_land(record.land_id.clone()));
                true
            }
            _ => {
                self.notifier.warning(MSG_LOAD_RECORD_FIRST);
                false
            }
        }
    }

    pub fn set_dialog_field(&mut self, field: DialogField, value: impl Into<String>) -> bool {
        let Some(dialog) = self.state.dialog.as_mut() else {
            self.notifier.warning(MSG_DIALOG_CLOSED);
            return false;
        };
        let value = value.into();
        match field {
            DialogField::NewOwnerAddress => dialog.new_owner_address = value,
            DialogField::NewOwnerName => dialog.new_owner_name = value,
            DialogField::NewOwnerContact => dialog.new_owner_contact = value,
        }
        true
    }

    pub fn close_transfer_dialog(&mut self) {
        self.state.dialog = None;
    }

    /// Starts registering the current form contents.
    pub fn begin_register(&self) -> PendingOperation {
        let transactions = self.transactions.clone();
        let form = self.state.form.clone();
        async move { Completion::Registered(transactions.register(&form).await) }.boxed_local()
    }

    /// Starts loading the record for the form's land id.
    pub fn begin_check(&self) -> PendingOperation {
        let queries = self.queries.clone();
        let land_id = self.state.form.land_id.clone();
        async move { Completion::Checked(queries.fetch_record(&land_id).await) }.boxed_local()
    }

    /// Starts submitting the open transfer dialog.
    pub fn begin_transfer(&self) -> PendingOperation {
        let Some(request) = self.state.dialog.clone() else {
            self.notifier.warning(MSG_DIALOG_CLOSED);
            let refused = LedgerError::ValidationError(MSG_DIALOG_CLOSED.into());
            return futures::future::ready(Completion::Transferred(Err(refused))).boxed_local();
        };
        let transactions = self.transactions.clone();
        async move { Completion::Transferred(transactions.transfer(&request).await) }.boxed_local()
    }

    /// Applies a finished operation.
    ///
    /// A registration mirrors the submitted record and clears the form. A load
    /// shows the record and clears the land id, or drops the shown record on a
    /// remote failure. A transfer closes the dialog and drops the record so the
    /// operator re-queries the new owner. Failures keep every input.
    pub fn complete(&mut self, completion: Completion) -> Result<(), LedgerError> {
        match completion {
            Completion::Registered(result) => {
                let record = result?;
                self.state.displayed_record = Some(record);
                self.state.form.clear();
            }
            Completion::Checked(Ok(record)) => {
                self.state.displayed_record = Some(record);
                self.state.form.land_id.clear();
            }
            Completion::Checked(Err(e)) => {
                if matches!(e, LedgerError::RemoteCallError(_)) {
                    self.state.displayed_record = None;
                }
                return Err(e);
            }
            Completion::Transferred(result) => {
                result?;
                self.state.dialog = None;
                self.state.displayed_record = None;
            }
        }
        Ok(())
    }

    pub async fn register(&mut self) -> Result<(), LedgerError> {
        let completion = self.begin_register().await;
        self.complete(completion)
    }

    pub async fn check(&mut self) -> Result<(), LedgerError> {
        let completion = self.begin_check().await;
        self.complete(completion)
    }

    pub async fn confirm_transfer(&mut self) -> Result<(), LedgerError> {
        let completion = self.begin_transfer().await;
        self.complete(completion)
    }
}
