//! tests/property_based_tests.rs
//!
//! Arbitrary account-change sequences never leave a half-built session.

mod util;

use land_ledger::blockchain::traits::WalletControl;
use land_ledger::core::notify::Severity;
use proptest::prelude::*;
use util::{account, count, Harness};

#[derive(Debug, Clone)]
enum WalletAction {
    Switch(u8),
    Lock,
}

fn wallet_action() -> impl Strategy<Value = WalletAction> {
    prop_oneof![
        3 => (1u8..=4).prop_map(WalletAction::Switch),
        1 => Just(WalletAction::Lock),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn session_is_never_partially_connected(actions in prop::collection::vec(wallet_action(), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let mut h = Harness::connected((1..=4).map(account).collect()).await;
            let mut locks = 0;

            for action in &actions {
                let expected = match action {
                    WalletAction::Switch(n) => {
                        h.wallet.switch_account(account(*n)).await.unwrap();
                        Some(account(*n))
                    }
                    WalletAction::Lock => {
                        h.wallet.lock();
                        locks += 1;
                        None
                    }
                };
                h.settle().await;

                let session = h.session.current();
                match session.connection() {
                    Some(connection) => {
                        assert_eq!(connection.signer().address(), connection.account());
                        assert_eq!(Some(connection.account()), expected);
                    }
                    None => {
                        assert!(session.account().is_none());
                        assert_eq!(expected, None);
                    }
                }
            }

            assert_eq!(count(&h.drain(), Severity::Warning), locks);
        });
    }
}
