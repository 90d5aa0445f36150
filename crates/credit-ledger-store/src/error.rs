//! Error types for credit ledger storage.

use credit_ledger_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// A billing-period idempotency key already exists (duplicate renewal
    /// delivery).
    #[error("duplicate billing period: {subscription_id} / {period}")]
    DuplicatePeriod {
        /// The subscription whose renewal was duplicated.
        subscription_id: String,
        /// The billing period token that was duplicated.
        period: String,
    },
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}
