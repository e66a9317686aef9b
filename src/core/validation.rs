use ethers::types::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use sha3::{Digest, Keccak256};
use std::str::FromStr;

use crate::core::errors::LedgerError;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Hardcoded regex should always compile"));

/// Format check for an Ethereum address. No existence check is made.
///
/// All-lowercase and all-uppercase bodies are accepted as-is; a mixed-case
/// body must carry a valid EIP-55 checksum.
pub fn validate_ethereum_address(address: &str) -> Result<Address, LedgerError> {
    if !ADDRESS_RE.is_match(address) {
        return Err(LedgerError::ValidationError("Invalid Ethereum address format".into()));
    }
    let body = &address[2..];
    let is_all_lower = !body.chars().any(|c| c.is_ascii_uppercase());
    let is_all_upper = !body.chars().any(|c| c.is_ascii_lowercase());
    if !(is_all_lower || is_all_upper) && !is_eip55_checksum_valid(body) {
        return Err(LedgerError::ValidationError(
            "Invalid EIP-55 checksum for Ethereum address".into(),
        ));
    }
    Address::from_str(body).map_err(|e| LedgerError::ValidationError(e.to_string()))
}

pub fn is_valid_address(address: &str) -> bool {
    validate_ethereum_address(address).is_ok()
}

fn is_eip55_checksum_valid(body: &str) -> bool {
    let lower = body.to_lowercase();
    let mut keccak = Keccak256::new();
    keccak.update(lower.as_bytes());
    let hash = keccak.finalize();
    for (i, ch) in body.chars().enumerate() {
        let nibble = (hash[i / 2] >> (4 * (1 - (i % 2)))) & 0x0f;
        match ch {
            'a'..='f' if nibble >= 8 => return false,
            'A'..='F' if nibble < 8 => return false,
            _ => {}
        }
    }
    true
}

/// Rejects the first field that is empty after trimming.
///
/// `fields` pairs a field name with its raw value; `message` is the
/// operator-facing text carried by the error.
pub fn require_fields(fields: &[(&str, &str)], message: &str) -> Result<(), LedgerError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => {
            tracing::debug!(field = %name, "required field missing");
            Err(LedgerError::ValidationError(message.to_string()))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed" ; "eip55 vector one")]
    #[test_case("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359" ; "eip55 vector two")]
    #[test_case("0x52908400098527886e0f7030069857d2e4169ee7" ; "all lowercase")]
    #[test_case("0x52908400098527886E0F7030069857D2E4169EE7" ; "all uppercase")]
    #[test_case("0x0000000000000000000000000000000000000000" ; "zero address")]
    fn accepts_well_formed(address: &str) {
        assert!(validate_ethereum_address(address).is_ok(), "{} should be valid", address);
    }

    #[test_case("not-an-address" ; "free text")]
    #[test_case("" ; "empty")]
    #[test_case("0x12345" ; "too short")]
    #[test_case("52908400098527886e0f7030069857d2e4169ee7" ; "missing prefix")]
    #[test_case("0x52908400098527886e0f7030069857d2e4169eeg" ; "non hex character")]
    #[test_case("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed" ; "bad checksum")]
    fn rejects_malformed(address: &str) {
        assert!(!is_valid_address(address), "{} should be invalid", address);
    }

    #[test]
    fn parsed_address_matches_input() {
        let addr = validate_ethereum_address("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert_eq!(format!("{:?}", addr), "0x52908400098527886e0f7030069857d2e4169ee7");
    }

    #[test]
    fn require_fields_trims() {
        assert!(require_fields(&[("landId", "CITY-001"), ("ownerName", "Al")], "Fill all fields").is_ok());
        let err = require_fields(&[("landId", "CITY-001"), ("ownerName", "   ")], "Fill all fields")
            .unwrap_err();
        assert_eq!(err, LedgerError::ValidationError("Fill all fields".into()));
    }
}
