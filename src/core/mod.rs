pub mod config;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod validation;

pub use domain::{LandDetails, LandRecord, RegisterForm, TransferRequest, WorkflowSection};
pub use errors::LedgerError;
pub use notify::{Notification, NotificationReceiver, Notifier, Severity};
