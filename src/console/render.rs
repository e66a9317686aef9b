//! Plain-text rendering of the operator screen.

use ethers::types::Address;
use ethers::utils::to_checksum;
use std::fmt::Write as _;

use crate::application::store::AppState;
use crate::core::domain::{LandRecord, RegisterForm, TransferRequest, WorkflowSection};
use crate::core::notify::Notification;
use crate::service::Session;

pub const HELP: &str = "\
commands:
  connect                                   request wallet account access
  section register|check|transfer           switch workflow section
  set land-id|owner-name|owner-contact <v>  edit the form
  register | check | open-transfer          run an action
  dialog address|name|contact <v>           edit the transfer dialog
  confirm | cancel                          submit or close the dialog
  wallet switch <address> | wallet lock     act inside the wallet
  show | help | quit";

/// `0x1234...abcd` form of an account.
pub fn short_address(address: Address) -> String {
    let full = to_checksum(&address, None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn render_header(session: &Session) -> String {
    match session.account() {
        Some(account) => format!("Land Registry | {}", short_address(account)),
        None if session.has_provider() => {
            "Land Registry | not connected (run `connect`)".to_string()
        }
        None => "Land Registry | no wallet provider".to_string(),
    }
}

pub fn render_tabs(current: WorkflowSection) -> String {
    [WorkflowSection::Register, WorkflowSection::Check, WorkflowSection::Transfer]
        .iter()
        .map(|s| if *s == current { format!("[{}]", s) } else { format!(" {} ", s) })
        .collect::<Vec<_>>()
        .join(" ")
}

fn field(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub fn render_form(section: WorkflowSection, form: &RegisterForm) -> String {
    match section {
        WorkflowSection::Register => format!(
            "Land ID: {}\nOwner name: {}\nOwner contact: {}\nactions: register, check, open-transfer",
            field(&form.land_id),
            field(&form.owner_name),
            field(&form.owner_contact)
        ),
        WorkflowSection::Check => format!("Land ID: {}\nactions: check", field(&form.land_id)),
        WorkflowSection::Transfer => "actions: open-transfer".to_string(),
    }
}

pub fn render_land_card(record: Option<&LandRecord>) -> String {
    let Some(record) = record else {
        return "No land selected".to_string();
    };
    let badge = if record.is_registered { "Registered" } else { "Unregistered" };
    let mut out = String::new();
    let _ = writeln!(out, "Land {} [{}]", record.land_id, badge);
    let _ = writeln!(out, "  Owner:   {}", record.owner_name);
    let _ = writeln!(out, "  Contact: {}", record.owner_contact);
    let _ = write!(out, "  Wallet:  {}", record.owner_checksum());
    out
}

pub fn render_dialog(dialog: &TransferRequest) -> String {
    format!(
        "Transfer land {}\n  New owner address: {}\n  New owner name:    {}\n  New owner contact: {}\nconfirm | cancel",
        dialog.land_id,
        field(&dialog.new_owner_address),
        field(&dialog.new_owner_name),
        field(&dialog.new_owner_contact)
    )
}

pub fn render_notification(notification: &Notification) -> String {
    format!("[{}] {}", notification.severity, notification.message)
}

pub fn render_screen(session: &Session, state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_header(session));
    let _ = writeln!(out, "{}", render_tabs(state.section));
    let _ = writeln!(out, "{}", render_form(state.section, &state.form));
    let _ = writeln!(out, "{}", render_land_card(state.displayed_record.as_ref()));
    if let Some(dialog) = &state.dialog {
        let _ = writeln!(out, "{}", render_dialog(dialog));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::Severity;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn short_address_keeps_checksum_case() {
        let address = Address::from_str("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert_eq!(short_address(address), "0x5290...9EE7");
    }

    #[test]
    fn header_without_provider() {
        assert_eq!(render_header(&Session::default()), "Land Registry | no wallet provider");
    }

    #[test]
    fn land_card_badges() {
        assert_eq!(render_land_card(None), "No land selected");
        let record = LandRecord {
            land_id: "CITY-001".into(),
            owner_name: "Alice".into(),
            owner_contact: "555-0100".into(),
            owner_address: Address::zero(),
            is_registered: true,
        };
        let card = render_land_card(Some(&record));
        assert!(card.starts_with("Land CITY-001 [Registered]"));
        assert!(card.contains("0x0000000000000000000000000000000000000000"));

        let unregistered = LandRecord { is_registered: false, ..record };
        assert!(render_land_card(Some(&unregistered)).contains("[Unregistered]"));
    }

    #[test]
    fn tabs_mark_current_section() {
        assert_eq!(render_tabs(WorkflowSection::Check), " register  [check]  transfer ");
    }

    #[test]
    fn check_section_shows_only_land_id() {
        let form = RegisterForm { land_id: "A-1".into(), owner_name: "Alice".into(), ..Default::default() };
        assert_eq!(render_form(WorkflowSection::Check, &form), "Land ID: A-1\nactions: check");
    }

    #[test]
    fn notification_line() {
        let n = Notification::new(Severity::Warning, "Connect wallet first");
        assert_eq!(render_notification(&n), "[warning] Connect wallet first");
    }
}
