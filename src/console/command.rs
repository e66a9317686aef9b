//! Operator command grammar.

use ethers::types::Address;
use thiserror::Error;

use crate::application::store::{DialogField, FormField};
use crate::core::domain::WorkflowSection;
use crate::core::validation::validate_ethereum_address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Section(WorkflowSection),
    Set(FormField, String),
    Connect,
    Register,
    Check,
    OpenTransfer,
    Dialog(DialogField, String),
    Confirm,
    Cancel,
    WalletSwitch(Address),
    WalletLock,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

fn usage(text: impl Into<String>) -> UsageError {
    UsageError(text.into())
}

impl Command {
    /// Whether the command is offered by `section`.
    pub fn available_in(&self, section: WorkflowSection) -> bool {
        match self {
            Command::Set(FormField::LandId, _) | Command::Check => {
                matches!(section, WorkflowSection::Register | WorkflowSection::Check)
            }
            Command::Set(_, _) | Command::Register => section == WorkflowSection::Register,
            Command::OpenTransfer => {
                matches!(section, WorkflowSection::Register | WorkflowSection::Transfer)
            }
            _ => true,
        }
    }

    /// Whether the command may run while the transfer dialog is open.
    pub fn allowed_in_dialog(&self) -> bool {
        matches!(
            self,
            Command::Dialog(_, _)
                | Command::Confirm
                | Command::Cancel
                | Command::WalletSwitch(_)
                | Command::WalletLock
                | Command::Show
                | Command::Help
                | Command::Quit
        )
    }
}

/// Splits off the first word; the remainder keeps its inner spacing.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Parses one input line. A blank line is `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, UsageError> {
    let (verb, rest) = split_word(line.trim());
    if verb.is_empty() {
        return Ok(None);
    }

    let command = match verb.to_ascii_lowercase().as_str() {
        "section" => Command::Section(rest.parse().map_err(usage)?),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(usage("usage: set land-id|owner-name|owner-contact <value>"));
            }
            Command::Set(field.parse().map_err(usage)?, value.to_string())
        }
        "dialog" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(usage("usage: dialog address|name|contact <value>"));
            }
            Command::Dialog(field.parse().map_err(usage)?, value.to_string())
        }
        "wallet" => {
            let (action, arg) = split_word(rest);
            match action {
                "switch" => {
                    let account = validate_ethereum_address(arg)
                        .map_err(|_| usage(format!("invalid account address '{}'", arg)))?;
                    Command::WalletSwitch(account)
                }
                "lock" => Command::WalletLock,
                _ => return Err(usage("usage: wallet switch <address> | wallet lock")),
            }
        }
        "connect" => Command::Connect,
        "register" => Command::Register,
        "check" => Command::Check,
        "open-transfer" => Command::OpenTransfer,
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(usage(format!("unknown command '{}', try 'help'", other))),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("connect", Command::Connect ; "connect")]
    #[test_case("  Register  ", Command::Register ; "case and padding")]
    #[test_case("section check", Command::Section(WorkflowSection::Check) ; "section")]
    #[test_case("set owner-name Alice  Smith", Command::Set(FormField::OwnerName, "Alice  Smith".into()) ; "value keeps inner spacing")]
    #[test_case("set land-id", Command::Set(FormField::LandId, String::new()) ; "empty value clears")]
    #[test_case("dialog address 0xabc", Command::Dialog(DialogField::NewOwnerAddress, "0xabc".into()) ; "dialog value is not validated")]
    #[test_case("wallet lock", Command::WalletLock ; "wallet lock")]
    #[test_case("exit", Command::Quit ; "exit alias")]
    fn parses(line: &str, expected: Command) {
        assert_eq!(parse_command(line), Ok(Some(expected)));
    }

    #[test_case("section admin" ; "unknown section")]
    #[test_case("set price 10" ; "unknown field")]
    #[test_case("wallet switch 0x123" ; "bad account")]
    #[test_case("wallet" ; "missing wallet action")]
    #[test_case("mint" ; "unknown verb")]
    fn rejects(line: &str) {
        assert!(parse_command(line).is_err());
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn wallet_switch_parses_address() {
        let parsed = parse_command("wallet switch 0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert!(matches!(parsed, Some(Command::WalletSwitch(_))));
    }

    #[test]
    fn sections_limit_actions() {
        assert!(Command::Check.available_in(WorkflowSection::Check));
        assert!(!Command::Register.available_in(WorkflowSection::Check));
        assert!(!Command::Set(FormField::OwnerName, String::new()).available_in(WorkflowSection::Check));
        assert!(Command::OpenTransfer.available_in(WorkflowSection::Transfer));
        assert!(!Command::Check.available_in(WorkflowSection::Transfer));
        assert!(!Command::Register.allowed_in_dialog());
        assert!(Command::Confirm.allowed_in_dialog());
    }
}
