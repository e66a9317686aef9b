use thiserror::Error;

/// Error taxonomy for every operation the client performs.
///
/// Each variant is produced at exactly one component boundary, where it is
/// also turned into a single operator notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No wallet provider is reachable. Permanent for the process lifetime.
    #[error("Wallet provider not found")]
    NoProvider,
    /// The provider refused or failed the account request. The operator may retry.
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// Guard failure: an operation needed a connected session.
    #[error("Wallet not connected")]
    NotConnected,
    /// Local input rejection. No remote call was made.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Submission was rejected or reverted, or a read call failed.
    #[error("Remote call failed: {0}")]
    RemoteCallError(String),
    /// Submitted but not confirmed.
    #[error("Confirmation failed: {0}")]
    ConfirmationError(String),
    /// A mutating call is already in flight and submissions are serialized.
    #[error("Another transaction is still pending")]
    Busy,
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The session manager was dropped; its application lifetime has ended.
    #[error("Session closed")]
    SessionClosed,
}

impl LedgerError {
    /// Whether the operator can recover by repeating the action.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LedgerError::NoProvider | LedgerError::ConfigError(_) | LedgerError::SessionClosed
        )
    }

    /// Whether the error was raised before any remote call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            LedgerError::NoProvider
                | LedgerError::NotConnected
                | LedgerError::ValidationError(_)
                | LedgerError::Busy
                | LedgerError::ConfigError(_)
                | LedgerError::SessionClosed
        )
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::ConfigError(err.to_string())
    }
}
