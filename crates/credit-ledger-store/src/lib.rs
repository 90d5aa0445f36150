//! `RocksDB` storage layer for the dual-wallet credit ledger.
//!
//! This crate provides persistent storage for wallets, ledger entries, and
//! reservations using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `wallets`: Primary wallet records, keyed by `user_id`
//! - `entries`: Ledger entries, keyed by `entry_id` (ULID)
//! - `entries_by_user`: Index for listing entries by user
//! - `reservations`: Reservation records, keyed by `reservation_id`
//! - `legacy_balances`: Denormalized single-number balance mirror
//! - `billing_periods`: Idempotency keys for subscription renewals
//!
//! All writes go through [`Store::commit`], which applies a whole
//! [`WalletCommit`] — new wallet state, ledger entries, optional reservation,
//! optional billing-period key, and the recomputed legacy mirror — in one
//! atomic `WriteBatch`. Partial application is impossible: either every part
//! of a mutation lands or none does.
//!
//! # Example
//!
//! ```no_run
//! use credit_ledger_store::{RocksStore, Store, WalletCommit};
//! use credit_ledger_core::{UserId, Wallet};
//!
//! let store = RocksStore::open("/tmp/credit-ledger-db").unwrap();
//!
//! // Create a wallet
//! let user_id = UserId::generate();
//! let wallet = Wallet::new(user_id);
//! store.commit(&WalletCommit::new(wallet)).unwrap();
//!
//! // Read it back
//! let retrieved = store.get_wallet(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use credit_ledger_core::{
    EntryId, LedgerEntry, Reservation, ReservationId, UserId, Wallet,
};

/// A billing-period idempotency marker.
///
/// One marker exists per `(subscription, period)` renewal; committing a
/// mutation that carries an already-present marker fails wholesale, so
/// duplicate webhook deliveries are rejected by the store rather than by
/// application logic racing a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    /// The subscription being renewed.
    pub subscription_id: String,

    /// A token identifying the period, e.g. the RFC 3339 period end.
    pub period: String,
}

/// One atomic wallet mutation.
///
/// Carries the full post-mutation wallet state plus everything that must
/// land with it. The legacy balance mirror is not part of the commit
/// payload: the store derives it from the wallet inside the batch, so it
/// can never be written independently of the pools it mirrors.
#[derive(Debug, Clone)]
pub struct WalletCommit {
    /// The wallet state to persist.
    pub wallet: Wallet,

    /// Ledger entries describing the mutation.
    pub entries: Vec<LedgerEntry>,

    /// Reservation to insert or update alongside the wallet, if any.
    pub reservation: Option<Reservation>,

    /// Billing-period idempotency marker to claim, if any.
    pub billing_period: Option<BillingPeriod>,
}

impl WalletCommit {
    /// Create a commit carrying only new wallet state.
    #[must_use]
    pub const fn new(wallet: Wallet) -> Self {
        Self {
            wallet,
            entries: Vec::new(),
            reservation: None,
            billing_period: None,
        }
    }

    /// Attach ledger entries to the commit.
    #[must_use]
    pub fn with_entries(mut self, entries: Vec<LedgerEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Attach a reservation insert/update to the commit.
    #[must_use]
    pub fn with_reservation(mut self, reservation: Reservation) -> Self {
        self.reservation = Some(reservation);
        self
    }

    /// Attach a billing-period idempotency marker to the commit.
    #[must_use]
    pub fn with_billing_period(mut self, period: BillingPeriod) -> Self {
        self.billing_period = Some(period);
        self
    }
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Wallet Operations
    // =========================================================================

    /// Get a wallet by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>>;

    /// Get the denormalized legacy balance for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_legacy_balance(&self, user_id: &UserId) -> Result<Option<i64>>;

    /// Write a legacy balance directly.
    ///
    /// Only for importing balances that predate the dual-pool wallet (and
    /// for test seeding). Once a wallet exists the mirror is maintained
    /// exclusively by [`Store::commit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_legacy_balance(&self, user_id: &UserId, balance: i64) -> Result<()>;

    // =========================================================================
    // Ledger Entry Operations
    // =========================================================================

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// List ledger entries for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Reservation Operations
    // =========================================================================

    /// Get a reservation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_reservation(&self, reservation_id: &ReservationId) -> Result<Option<Reservation>>;

    // =========================================================================
    // Billing Period Operations (for idempotency)
    // =========================================================================

    /// Check if a billing-period marker has already been claimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_billing_period(&self, subscription_id: &str, period: &str) -> Result<bool>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Apply a wallet mutation atomically.
    ///
    /// Writes the wallet, its ledger entries (plus user index rows), the
    /// optional reservation, the optional billing-period marker, and the
    /// recomputed legacy balance mirror in a single batch.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicatePeriod` if the commit carries a
    ///   billing-period marker that already exists; nothing is written.
    /// - `StoreError::Database` / `StoreError::Serialization` on failure.
    fn commit(&self, commit: &WalletCommit) -> Result<()>;
}
