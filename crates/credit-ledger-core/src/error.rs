//! Error types for the credit ledger.

use crate::ids::IdError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The requested amount exceeds both pools.
    ///
    /// `available` is the pool sum only; grace capacity participates in the
    /// accept/reject decision but is deliberately excluded from the figure
    /// reported to callers.
    #[error("insufficient credits: required={required}, available={available}")]
    InsufficientCredits {
        /// The amount that was requested.
        required: i64,
        /// Subscription plus top-up credits at the time of the request.
        available: i64,
    },

    /// A non-positive amount was passed to a mutating operation.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// Wallet not found.
    #[error("wallet not found: {user_id}")]
    WalletNotFound {
        /// The user ID that was not found.
        user_id: String,
    },

    /// Reservation not found.
    #[error("reservation not found: {reservation_id}")]
    ReservationNotFound {
        /// The reservation ID that was not found.
        reservation_id: String,
    },

    /// Initial subscription grant attempted on a wallet that already holds
    /// subscription credits.
    #[error("subscription credits already granted: {user_id}")]
    AlreadyGranted {
        /// The user whose wallet already holds subscription credits.
        user_id: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),
}
