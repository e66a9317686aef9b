use tracing::{debug, info, instrument};

use super::session::SessionReader;
use super::transaction::MSG_NOT_CONNECTED;
use crate::core::domain::LandRecord;
use crate::core::errors::LedgerError;
use crate::core::notify::Notifier;

pub const MSG_ENTER_LAND_ID: &str = "Enter Land ID";
pub const MSG_DETAILS_LOADED: &str = "Details loaded";
pub const MSG_LAND_NOT_FOUND: &str = "Land not registered or invalid ID";

/// Read path of the registry.
///
/// The contract does not tell "no such parcel" apart from other read errors,
/// so every remote failure is reported the same way.
#[derive(Clone)]
pub struct QueryService {
    session: SessionReader,
    notifier: Notifier,
}

impl QueryService {
    pub fn new(session: SessionReader, notifier: Notifier) -> Self {
        Self { session, notifier }
    }

    #[instrument(skip(self))]
    pub async fn fetch_record(&self, land_id: &str) -> Result<LandRecord, LedgerError> {
        let session = self.session.current();
        let Some(connection) = session.connection() else {
            self.notifier.warning(MSG_NOT_CONNECTED);
            return Err(LedgerError::NotConnected);
        };
        let land_id = land_id.trim();
        if land_id.is_empty() {
            self.notifier.warning(MSG_ENTER_LAND_ID);
            return Err(LedgerError::ValidationError(MSG_ENTER_LAND_ID.into()));
        }

        let contract = connection.contract();
        drop(session);

        match contract.get_land_details(land_id).await {
            // A default-valued struct means the id is unknown to the contract.
            Ok(details) if !details.0.trim().is_empty() => {
                let record = LandRecord::from(details);
                info!(land_id = %record.land_id, registered = record.is_registered, "Land details loaded");
                self.notifier.success(MSG_DETAILS_LOADED);
                Ok(record)
            }
            Ok(_) => {
                debug!("Contract returned an empty record");
                self.notifier.error(MSG_LAND_NOT_FOUND);
                Err(LedgerError::RemoteCallError(MSG_LAND_NOT_FOUND.into()))
            }
            Err(failure) => {
                debug!(%failure, "getLandDetails failed");
                self.notifier.error(MSG_LAND_NOT_FOUND);
                Err(LedgerError::RemoteCallError(MSG_LAND_NOT_FOUND.into()))
            }
        }
    }
}
