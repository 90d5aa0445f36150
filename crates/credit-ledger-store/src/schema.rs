//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary wallet records, keyed by `user_id`.
    pub const WALLETS: &str = "wallets";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const ENTRIES: &str = "entries";

    /// Index: entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const ENTRIES_BY_USER: &str = "entries_by_user";

    /// Reservations, keyed by `reservation_id` (ULID).
    pub const RESERVATIONS: &str = "reservations";

    /// Denormalized single-number balances for legacy consumers, keyed by
    /// `user_id`. A materialized view of `subscription + top_up`, rewritten
    /// inside every wallet commit and doubling as the migration seed for
    /// wallets created over a pre-existing balance.
    pub const LEGACY_BALANCES: &str = "legacy_balances";

    /// Billing-period idempotency keys, keyed by
    /// `subscription_id || period end`. Value is empty (presence only).
    pub const BILLING_PERIODS: &str = "billing_periods";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::WALLETS,
        cf::ENTRIES,
        cf::ENTRIES_BY_USER,
        cf::RESERVATIONS,
        cf::LEGACY_BALANCES,
        cf::BILLING_PERIODS,
    ]
}
