use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw positional response of `getLandDetails`:
/// `(landId, ownerName, ownerContact, ownerAddress, isRegistered)`.
pub type LandDetails = (String, String, String, Address, bool);

/// A land parcel as displayed to the operator. Replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandRecord {
    pub land_id: String,
    pub owner_name: String,
    pub owner_contact: String,
    pub owner_address: Address,
    pub is_registered: bool,
}

impl LandRecord {
    /// Local mirror of a just-confirmed registration.
    pub fn registered(form: &RegisterForm, owner_address: Address) -> Self {
        Self {
            land_id: form.land_id.clone(),
            owner_name: form.owner_name.clone(),
            owner_contact: form.owner_contact.clone(),
            owner_address,
            is_registered: true,
        }
    }

    pub fn owner_checksum(&self) -> String {
        to_checksum(&self.owner_address, None)
    }
}

impl From<LandDetails> for LandRecord {
    fn from(details: LandDetails) -> Self {
        let (land_id, owner_name, owner_contact, owner_address, is_registered) = details;
        Self { land_id, owner_name, owner_contact, owner_address, is_registered }
    }
}

/// The workflow tab currently shown to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowSection {
    #[default]
    Register,
    Check,
    Transfer,
}

impl WorkflowSection {
    /// Entering Register or Check drops the displayed record; Transfer keeps it.
    pub fn clears_record(self) -> bool {
        matches!(self, WorkflowSection::Register | WorkflowSection::Check)
    }
}

impl fmt::Display for WorkflowSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowSection::Register => "register",
            WorkflowSection::Check => "check",
            WorkflowSection::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

impl FromStr for WorkflowSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "register" => Ok(WorkflowSection::Register),
            "check" => Ok(WorkflowSection::Check),
            "transfer" => Ok(WorkflowSection::Transfer),
            other => Err(format!("unknown section '{}'", other)),
        }
    }
}

/// Register / query form inputs as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub land_id: String,
    pub owner_name: String,
    pub owner_contact: String,
}

impl RegisterForm {
    pub fn trimmed(&self) -> Self {
        Self {
            land_id: self.land_id.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            owner_contact: self.owner_contact.trim().to_string(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Inputs of the transfer dialog. Exists only while the dialog is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub land_id: String,
    pub new_owner_address: String,
    pub new_owner_name: String,
    pub new_owner_contact: String,
}

impl TransferRequest {
    /// Fresh dialog inputs with the parcel id prefilled.
    pub fn for_land(land_id: impl Into<String>) -> Self {
        Self { land_id: land_id.into(), ..Default::default() }
    }

    pub fn trimmed(&self) -> Self {
        Self {
            land_id: self.land_id.trim().to_string(),
            new_owner_address: self.new_owner_address.trim().to_string(),
            new_owner_name: self.new_owner_name.trim().to_string(),
            new_owner_contact: self.new_owner_contact.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_from_details_keeps_positions() {
        let owner = Address::repeat_byte(0x11);
        let record = LandRecord::from((
            "CITY-001".to_string(),
            "Alice".to_string(),
            "alice@example.com".to_string(),
            owner,
            true,
        ));
        assert_eq!(record.land_id, "CITY-001");
        assert_eq!(record.owner_name, "Alice");
        assert_eq!(record.owner_contact, "alice@example.com");
        assert_eq!(record.owner_address, owner);
        assert!(record.is_registered);
    }

    #[test]
    fn registered_record_uses_form_values() {
        let form = RegisterForm {
            land_id: "L-7".into(),
            owner_name: "Bob".into(),
            owner_contact: "555-0101".into(),
        };
        let account = Address::repeat_byte(0x22);
        let record = LandRecord::registered(&form, account);
        assert_eq!(record.owner_address, account);
        assert!(record.is_registered);
    }

    #[test]
    fn section_record_clearing() {
        assert!(WorkflowSection::Register.clears_record());
        assert!(WorkflowSection::Check.clears_record());
        assert!(!WorkflowSection::Transfer.clears_record());
    }

    #[test]
    fn section_parse() {
        assert_eq!("Check".parse::<WorkflowSection>().unwrap(), WorkflowSection::Check);
        assert_eq!(" transfer ".parse::<WorkflowSection>().unwrap(), WorkflowSection::Transfer);
        assert!("admin".parse::<WorkflowSection>().is_err());
    }

    #[test]
    fn form_trim_and_clear() {
        let mut form = RegisterForm {
            land_id: "  CITY-001 ".into(),
            owner_name: "\tAlice".into(),
            owner_contact: "  ".into(),
        };
        let t = form.trimmed();
        assert_eq!(t.land_id, "CITY-001");
        assert_eq!(t.owner_name, "Alice");
        assert_eq!(t.owner_contact, "");
        form.clear();
        assert_eq!(form, RegisterForm::default());
    }

    #[test]
    fn transfer_request_prefill() {
        let req = TransferRequest::for_land("CITY-001");
        assert_eq!(req.land_id, "CITY-001");
        assert!(req.new_owner_address.is_empty());
    }
}
