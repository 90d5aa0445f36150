//! Ledger entry types for the credit ledger.
//!
//! Every wallet mutation appends immutable entries; the sequence of entries
//! for a pool reconstructs that pool's current balance by replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, SourceRef, UserId};

/// Metadata key marking a balance-neutral grace entry.
pub const GRACE_METADATA_KEY: &str = "grace";

/// Metadata key recording credits forfeited by a RESET entry.
pub const EXPIRED_CREDITS_METADATA_KEY: &str = "expired_credits";

/// Which pool an entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Expiring, per-billing-period pool.
    Subscription,

    /// Perpetual pool.
    TopUp,
}

impl Pool {
    /// Get the pool name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::TopUp => "top_up",
        }
    }
}

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Credits added to a pool (grant or purchase).
    Credit,

    /// Credits removed from a pool for usage.
    Debit,

    /// Credits returned after failed or cancelled work.
    Refund,

    /// Pool overwritten at a billing-cycle boundary (renewal or revoke).
    Reset,
}

impl EntryKind {
    /// Check if this entry kind adds credits.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Credit | Self::Refund)
    }

    /// Check if this entry kind removes credits.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self, Self::Debit)
    }
}

/// An immutable record of a single pool balance change.
///
/// Entries are append-only: they are written once inside the same atomic
/// commit as the wallet mutation they describe and never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The user whose wallet was affected.
    pub user_id: UserId,

    /// Which pool the entry applies to.
    pub pool: Pool,

    /// Type of entry.
    pub kind: EntryKind,

    /// Amount moved. Always positive; direction comes from `kind`.
    pub amount: i64,

    /// Pool balance before this entry.
    pub balance_before: i64,

    /// Pool balance after this entry.
    pub balance_after: i64,

    /// What caused this entry.
    pub source: SourceRef,

    /// Human-readable description.
    pub description: String,

    /// Additional context (grace flag, forfeited credits, job IDs).
    pub metadata: serde_json::Value,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a debit entry for a usage deduction.
    #[must_use]
    pub fn debit(
        user_id: UserId,
        pool: Pool,
        amount: i64,
        balance_before: i64,
        source: SourceRef,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            pool,
            kind: EntryKind::Debit,
            amount,
            balance_before,
            balance_after: balance_before - amount,
            source,
            description,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a credit entry for a grant or purchase.
    #[must_use]
    pub fn credit(
        user_id: UserId,
        pool: Pool,
        amount: i64,
        balance_before: i64,
        source: SourceRef,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            pool,
            kind: EntryKind::Credit,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            source,
            description,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a refund entry. Refunds always land on the top-up pool.
    #[must_use]
    pub fn refund(
        user_id: UserId,
        amount: i64,
        balance_before: i64,
        source: SourceRef,
        reason: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            pool: Pool::TopUp,
            kind: EntryKind::Refund,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            source,
            description: reason,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create a reset entry that overwrites the subscription pool.
    ///
    /// `amount` is the new pool balance; the forfeited prior balance is
    /// recorded under [`EXPIRED_CREDITS_METADATA_KEY`].
    #[must_use]
    pub fn reset(
        user_id: UserId,
        new_balance: i64,
        balance_before: i64,
        source: SourceRef,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            pool: Pool::Subscription,
            kind: EntryKind::Reset,
            amount: new_balance,
            balance_before,
            balance_after: new_balance,
            source,
            description,
            metadata: serde_json::json!({ EXPIRED_CREDITS_METADATA_KEY: balance_before }),
            created_at: Utc::now(),
        }
    }

    /// Create a balance-neutral entry recording grace consumption.
    ///
    /// Grace is a loan, not a pool balance: the entry carries the consumed
    /// amount for audit but `balance_before == balance_after`, so replay
    /// skips it.
    #[must_use]
    pub fn grace(
        user_id: UserId,
        amount: i64,
        pool_balance: i64,
        source: SourceRef,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            pool: Pool::TopUp,
            kind: EntryKind::Debit,
            amount,
            balance_before: pool_balance,
            balance_after: pool_balance,
            source,
            description,
            metadata: serde_json::json!({ GRACE_METADATA_KEY: true }),
            created_at: Utc::now(),
        }
    }

    /// Whether this entry is a balance-neutral grace marker.
    #[must_use]
    pub fn is_grace(&self) -> bool {
        self.metadata
            .get(GRACE_METADATA_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Credits forfeited by this RESET entry, if any.
    #[must_use]
    pub fn forfeited(&self) -> i64 {
        self.metadata
            .get(EXPIRED_CREDITS_METADATA_KEY)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    }
}

/// Reconstruct a pool balance by replaying its entries in order.
///
/// Credits and refunds add `amount`, debits subtract it, resets overwrite
/// the running balance with `amount`. Balance-neutral grace markers are
/// skipped. Entries for other pools must be filtered out by the caller.
#[must_use]
pub fn replay(initial_balance: i64, entries: &[LedgerEntry]) -> i64 {
    entries.iter().fold(initial_balance, |balance, entry| {
        if entry.is_grace() {
            return balance;
        }
        match entry.kind {
            EntryKind::Credit | EntryKind::Refund => balance + entry.amount,
            EntryKind::Debit => balance - entry.amount,
            EntryKind::Reset => entry.amount,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;

    fn src() -> SourceRef {
        SourceRef::bare(SourceKind::Generation)
    }

    #[test]
    fn debit_entry_balances() {
        let entry = LedgerEntry::debit(
            UserId::generate(),
            Pool::Subscription,
            30,
            100,
            src(),
            "generation".into(),
        );

        assert_eq!(entry.kind, EntryKind::Debit);
        assert_eq!(entry.balance_before, 100);
        assert_eq!(entry.balance_after, 70);
        assert!(!entry.is_grace());
    }

    #[test]
    fn grace_entry_is_balance_neutral() {
        let entry = LedgerEntry::grace(UserId::generate(), 5, 0, src(), "grace loan".into());

        assert_eq!(entry.amount, 5);
        assert_eq!(entry.balance_before, entry.balance_after);
        assert!(entry.is_grace());
    }

    #[test]
    fn reset_entry_records_forfeiture() {
        let entry = LedgerEntry::reset(
            UserId::generate(),
            1000,
            340,
            SourceRef::new(SourceKind::Subscription, "sub_1"),
            "renewal".into(),
        );

        assert_eq!(entry.balance_after, 1000);
        assert_eq!(entry.forfeited(), 340);
    }

    #[test]
    fn entry_kind_direction() {
        assert!(EntryKind::Credit.is_credit());
        assert!(EntryKind::Refund.is_credit());
        assert!(!EntryKind::Debit.is_credit());
        assert!(EntryKind::Debit.is_debit());
        assert!(!EntryKind::Reset.is_debit());
    }

    #[test]
    fn replay_reconstructs_balance() {
        let user_id = UserId::generate();
        let entries = vec![
            LedgerEntry::credit(user_id, Pool::Subscription, 100, 0, src(), "grant".into()),
            LedgerEntry::debit(user_id, Pool::Subscription, 30, 100, src(), "usage".into()),
            LedgerEntry::reset(user_id, 1000, 70, src(), "renewal".into()),
            LedgerEntry::debit(user_id, Pool::Subscription, 250, 1000, src(), "usage".into()),
        ];

        assert_eq!(replay(0, &entries), 750);
    }

    #[test]
    fn replay_skips_grace_markers() {
        let user_id = UserId::generate();
        let entries = vec![
            LedgerEntry::credit(user_id, Pool::TopUp, 20, 0, src(), "purchase".into()),
            LedgerEntry::debit(user_id, Pool::TopUp, 20, 20, src(), "usage".into()),
            LedgerEntry::grace(user_id, 5, 0, src(), "grace loan".into()),
            LedgerEntry::refund(
                user_id,
                25,
                0,
                src(),
                "released".into(),
                serde_json::Value::Null,
            ),
        ];

        assert_eq!(replay(0, &entries), 25);
    }
}
