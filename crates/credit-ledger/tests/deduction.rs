//! Deduction integration tests: pool order, grace, rejection atomicity.

mod common;

use common::{assert_legacy_mirror, generation_source, TestHarness};
use credit_ledger_core::{EntryKind, LedgerError, Pool};

// ============================================================================
// Pool order
// ============================================================================

#[test]
fn subscription_pool_drains_before_top_up() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(5, 10, 0);

    let outcome = harness
        .ledger
        .deduct_credits(user_id, 12, generation_source(), None)
        .unwrap();

    assert_eq!(outcome.subscription_deducted, 5);
    assert_eq!(outcome.top_up_deducted, 7);
    assert_eq!(outcome.total_deducted, 12);
    assert_eq!(outcome.new_subscription_balance, 0);
    assert_eq!(outcome.new_top_up_balance, 3);

    let balance = harness.ledger.get_balance(user_id).unwrap();
    assert_eq!(balance.subscription_credits, 0);
    assert_eq!(balance.top_up_credits, 3);
    assert_legacy_mirror(&harness, user_id);
}

#[test]
fn deduction_appends_one_debit_per_pool() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(5, 10, 0);

    harness
        .ledger
        .deduct_credits(user_id, 12, generation_source(), Some("video job".into()))
        .unwrap();

    let history = harness.ledger.get_transaction_history(user_id, 10).unwrap();
    let debits: Vec<_> = history
        .iter()
        .filter(|e| e.kind == EntryKind::Debit)
        .collect();

    assert_eq!(debits.len(), 2);
    assert!(debits.iter().any(|e| e.pool == Pool::Subscription && e.amount == 5));
    assert!(debits.iter().any(|e| e.pool == Pool::TopUp && e.amount == 7));
}

// ============================================================================
// Grace
// ============================================================================

#[test]
fn grace_covers_shortfall_without_touching_pools() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(0, 0, 5);

    harness
        .ledger
        .deduct_credits(user_id, 3, generation_source(), None)
        .unwrap();

    let wallet = harness.ledger.get_or_create_wallet(user_id).unwrap();
    assert_eq!(wallet.subscription_credits, 0);
    assert_eq!(wallet.top_up_credits, 0);
    assert_eq!(wallet.grace_used, 3);
    assert_eq!(wallet.grace_limit, 2);

    // The grace entry is balance-neutral and flagged
    let history = harness.ledger.get_transaction_history(user_id, 10).unwrap();
    let grace_entry = history.iter().find(|e| e.is_grace()).unwrap();
    assert_eq!(grace_entry.amount, 3);
    assert_eq!(grace_entry.balance_before, grace_entry.balance_after);
    assert_legacy_mirror(&harness, user_id);
}

#[test]
fn grace_exhaustion_fails_and_mutates_nothing() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(0, 0, 2);

    let err = harness
        .ledger
        .deduct_credits(user_id, 3, generation_source(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCredits {
            required: 3,
            available: 0
        }
    ));

    let wallet = harness.ledger.get_or_create_wallet(user_id).unwrap();
    assert_eq!(wallet.grace_limit, 2);
    assert_eq!(wallet.grace_used, 0);

    let history = harness.ledger.get_transaction_history(user_id, 10).unwrap();
    assert!(history.iter().all(|e| e.kind != EntryKind::Debit));
}

// ============================================================================
// End-to-end (subscription-only wallet)
// ============================================================================

#[test]
fn subscription_wallet_end_to_end() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(100, 0, 0);

    harness
        .ledger
        .deduct_credits(user_id, 30, generation_source(), None)
        .unwrap();

    let balance = harness.ledger.get_balance(user_id).unwrap();
    assert_eq!(balance.subscription_credits, 70);
    assert_eq!(balance.top_up_credits, 0);

    let history = harness.ledger.get_transaction_history(user_id, 10).unwrap();
    let debits: Vec<_> = history
        .iter()
        .filter(|e| e.kind == EntryKind::Debit)
        .collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].pool, Pool::Subscription);
    assert_eq!(debits[0].amount, 30);

    // An unaffordable deduction reports available = pool sum and changes nothing
    let err = harness
        .ledger
        .deduct_credits(user_id, 150, generation_source(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCredits {
            required: 150,
            available: 70
        }
    ));

    let balance = harness.ledger.get_balance(user_id).unwrap();
    assert_eq!(balance.subscription_credits, 70);
    assert_legacy_mirror(&harness, user_id);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn non_positive_cost_rejected() {
    let harness = TestHarness::new();
    let user_id = harness.seed_wallet(10, 0, 0);

    assert!(matches!(
        harness
            .ledger
            .deduct_credits(user_id, 0, generation_source(), None),
        Err(LedgerError::InvalidAmount { amount: 0 })
    ));
    assert!(matches!(
        harness
            .ledger
            .deduct_credits(user_id, -5, generation_source(), None),
        Err(LedgerError::InvalidAmount { amount: -5 })
    ));
}
