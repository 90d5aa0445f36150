//! Shared test harness: a ledger over a throwaway RocksDB.

#![allow(dead_code)] // Not every test file uses every helper.

use credit_ledger::CreditLedger;
use credit_ledger_core::{SourceKind, SourceRef, UserId};
use credit_ledger_store::{RocksStore, Store};
use tempfile::TempDir;

/// A ledger over a temporary database. Dropping the harness removes the
/// database files.
pub struct TestHarness {
    pub ledger: CreditLedger<RocksStore>,
    _dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        Self {
            ledger: CreditLedger::new(store),
            _dir: dir,
        }
    }

    /// Seed a wallet with the given pool balances and grace allowance.
    pub fn seed_wallet(&self, subscription: i64, top_up: i64, grace: i64) -> UserId {
        let user_id = UserId::generate();

        if subscription > 0 {
            self.ledger
                .grant_initial_subscription_credits(
                    user_id,
                    subscription,
                    chrono::Utc::now() + chrono::Duration::days(30),
                    Some("sub_seed".into()),
                )
                .unwrap();
        }
        if top_up > 0 {
            self.ledger
                .add_top_up_credits(user_id, top_up, Some("cs_seed".into()), None)
                .unwrap();
        }
        if grace > 0 {
            self.ledger.set_grace_limit(user_id, grace).unwrap();
        }

        self.ledger.get_or_create_wallet(user_id).unwrap();
        user_id
    }
}

pub fn generation_source() -> SourceRef {
    SourceRef::new(SourceKind::Generation, "job_test")
}

/// Assert the legacy mirror equals the sum of both pools for the user.
pub fn assert_legacy_mirror(harness: &TestHarness, user_id: UserId) {
    let balance = harness.ledger.get_balance(user_id).unwrap();
    let legacy = harness
        .ledger
        .store()
        .get_legacy_balance(&user_id)
        .unwrap()
        .unwrap_or(0);
    assert_eq!(
        legacy, balance.total_credits,
        "legacy mirror diverged from pool sum"
    );
}
