//! Dual-wallet credit ledger.
//!
//! This crate exposes the public operations of the credit system: balance
//! reads, the two-pool-plus-grace deduction, the reserve/capture/release
//! protocol for paying long-running asynchronous work, billing-cycle
//! grant/reset/revoke, and the top-up/refund path.
//!
//! All operations go through [`CreditLedger`], which serializes every
//! read-modify-write per user and persists each mutation as one atomic
//! store commit: wallet, ledger entries, reservation state, and the legacy
//! balance mirror land together or not at all.
//!
//! # Example
//!
//! ```no_run
//! use credit_ledger::CreditLedger;
//! use credit_ledger_core::{SourceKind, SourceRef, UserId};
//! use credit_ledger_store::RocksStore;
//!
//! let store = RocksStore::open("/tmp/credit-ledger-db").unwrap();
//! let ledger = CreditLedger::new(store);
//!
//! let user_id = UserId::generate();
//! ledger.add_top_up_credits(user_id, 100, Some("cs_123".into()), None).unwrap();
//!
//! let receipt = ledger
//!     .reserve(
//!         user_id,
//!         25,
//!         SourceRef::new(SourceKind::Generation, "job_1"),
//!         serde_json::json!({"model": "video-v2"}),
//!     )
//!     .unwrap();
//!
//! // ... asynchronous work runs ...
//! ledger.capture(&receipt.reservation_id, None).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod credits;
mod cycle;
mod deduct;
mod locks;
mod reserve;
mod wallets;

pub use reserve::ReservationReceipt;

use std::sync::Arc;

use credit_ledger_store::{RocksStore, Store};

use crate::locks::UserLocks;

/// The credit ledger facade.
///
/// Generic over the storage backend; production code uses [`RocksStore`].
/// Cheap to share behind an `Arc` across callers; the per-user lock registry
/// serializes concurrent mutations of the same wallet.
pub struct CreditLedger<S: Store = RocksStore> {
    store: Arc<S>,
    locks: UserLocks,
}

impl<S: Store> CreditLedger<S> {
    /// Create a ledger over a storage backend.
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    /// Create a ledger over an already-shared storage backend.
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            locks: UserLocks::default(),
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
