//! tests/store_tests.rs
//!
//! Application state transitions driven through the store.

mod util;

use land_ledger::application::store::{DialogField, FormField, MSG_LOAD_RECORD_FIRST};
use land_ledger::application::AppStore;
use land_ledger::blockchain::mock::RegistryCall;
use land_ledger::core::domain::{LandRecord, RegisterForm, WorkflowSection};
use land_ledger::core::notify::Severity;
use pretty_assertions::assert_eq;
use test_case::test_case;
use util::{account, count, Harness};

const NEW_OWNER: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

fn fill_form(store: &mut AppStore, land_id: &str) {
    store.set_field(FormField::LandId, land_id);
    store.set_field(FormField::OwnerName, "Alice");
    store.set_field(FormField::OwnerContact, "555-0100");
}

/// Store whose displayed record is a freshly loaded registered parcel.
async fn store_with_loaded_record(h: &mut Harness) -> AppStore {
    h.registry().insert_record((
        "CITY-001".into(),
        "Alice".into(),
        "555-0100".into(),
        account(1),
        true,
    ));
    let mut store = h.store();
    store.select_section(WorkflowSection::Check);
    store.set_field(FormField::LandId, "CITY-001");
    store.check().await.unwrap();
    h.drain();
    store
}

#[test_case(WorkflowSection::Register ; "register")]
#[test_case(WorkflowSection::Check ; "check")]
#[tokio::test]
async fn test_entering_register_or_check_clears_record(target: WorkflowSection) {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;
    store.select_section(WorkflowSection::Transfer);
    assert!(store.state().displayed_record.is_some());

    store.select_section(target);
    assert_eq!(store.state().section, target);
    assert!(store.state().displayed_record.is_none());
}

#[tokio::test]
async fn test_register_mirrors_inputs_without_reading() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = h.store();
    fill_form(&mut store, "CITY-007");

    store.register().await.unwrap();
    assert_eq!(
        store.state().displayed_record,
        Some(LandRecord {
            land_id: "CITY-007".into(),
            owner_name: "Alice".into(),
            owner_contact: "555-0100".into(),
            owner_address: account(1),
            is_registered: true,
        })
    );
    assert_eq!(store.state().form, RegisterForm::default());
    assert!(!h.registry().calls().iter().any(|c| matches!(c, RegistryCall::Details { .. })));
    assert_eq!(count(&h.drain(), Severity::Success), 1);
}

#[tokio::test]
async fn test_failed_register_keeps_form() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = h.store();
    fill_form(&mut store, "CITY-007");
    h.registry()
        .fail_next_submit(land_ledger::blockchain::RemoteFailure::with_reason("Land already registered"));

    assert!(store.register().await.is_err());
    assert_eq!(store.state().form.land_id, "CITY-007");
    assert_eq!(store.state().form.owner_name, "Alice");
    assert!(store.state().displayed_record.is_none());
    assert_eq!(count(&h.drain(), Severity::Error), 1);
}

#[tokio::test]
async fn test_successful_check_clears_land_id() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let store = store_with_loaded_record(&mut h).await;
    assert_eq!(store.state().form.land_id, "");
    assert_eq!(store.state().displayed_record.as_ref().map(|r| r.land_id.as_str()), Some("CITY-001"));
}

#[tokio::test]
async fn test_unknown_land_clears_record_and_keeps_input() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;
    store.set_field(FormField::LandId, "NOPE-999");

    assert!(store.check().await.is_err());
    assert!(store.state().displayed_record.is_none());
    assert_eq!(store.state().form.land_id, "NOPE-999");

    let notes = h.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_blank_check_keeps_record() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;

    assert!(store.check().await.is_err());
    assert!(store.state().displayed_record.is_some());
    assert_eq!(count(&h.drain(), Severity::Warning), 1);
}

#[tokio::test]
async fn test_open_dialog_without_record_warns_once() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = h.store();

    assert!(!store.open_transfer_dialog());
    assert!(!store.state().dialog_open());
    let notes = h.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Warning);
    assert_eq!(notes[0].message, MSG_LOAD_RECORD_FIRST);
}

#[tokio::test]
async fn test_open_dialog_prefills_land_id_and_resets_inputs() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;

    assert!(store.open_transfer_dialog());
    store.set_dialog_field(DialogField::NewOwnerName, "Bob");
    store.close_transfer_dialog();
    assert!(!store.state().dialog_open());

    assert!(store.open_transfer_dialog());
    let dialog = store.state().dialog.clone().unwrap();
    assert_eq!(dialog.land_id, "CITY-001");
    assert_eq!(dialog.new_owner_name, "");
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_successful_transfer_closes_dialog_and_drops_record() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;
    store.select_section(WorkflowSection::Transfer);

    assert!(store.open_transfer_dialog());
    store.set_dialog_field(DialogField::NewOwnerAddress, NEW_OWNER);
    store.set_dialog_field(DialogField::NewOwnerName, "Bob");
    store.set_dialog_field(DialogField::NewOwnerContact, "555-0199");

    store.confirm_transfer().await.unwrap();
    assert!(!store.state().dialog_open());
    assert!(store.state().displayed_record.is_none());
    assert_eq!(h.registry().record("CITY-001").unwrap().1, "Bob");
}

#[tokio::test]
async fn test_malformed_address_keeps_dialog_open() {
    let mut h = Harness::connected(vec![account(1)]).await;
    let mut store = store_with_loaded_record(&mut h).await;

    assert!(store.open_transfer_dialog());
    store.set_dialog_field(DialogField::NewOwnerAddress, "not-an-address");
    store.set_dialog_field(DialogField::NewOwnerName, "Bob");
    store.set_dialog_field(DialogField::NewOwnerContact, "555-0199");

    assert!(store.confirm_transfer().await.is_err());
    assert!(store.state().dialog_open());
    assert!(store.state().displayed_record.is_some());
    assert!(!h.registry().calls().iter().any(|c| matches!(c, RegistryCall::Transfer { .. })));

    let notes = h.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Error);
}
