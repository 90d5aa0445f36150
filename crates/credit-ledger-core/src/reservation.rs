//! Reservation types for the pay-then-finalize protocol.
//!
//! A reservation is a debit taken before asynchronous work begins, resolved
//! later by capture (keep the debit) or release (refund it).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReservationId, SourceRef, UserId};

/// Metadata key recording why a reservation was released.
pub const RELEASE_REASON_METADATA_KEY: &str = "release_reason";

/// Status of a reservation.
///
/// `Reserved` is the only non-terminal state; exactly one of capture or
/// release may move a reservation out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Credits deducted, outcome of the work not yet known.
    Reserved,

    /// Work succeeded; the debit stands.
    Completed,

    /// Work failed or was cancelled; the debit was refunded.
    Cancelled,
}

impl ReservationStatus {
    /// Whether this is a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A pay-now, finalize-later usage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation ID (ULID for time-ordering).
    pub id: ReservationId,

    /// The user who paid.
    pub user_id: UserId,

    /// Current status.
    pub status: ReservationStatus,

    /// Credits deducted at reserve time.
    pub cost: i64,

    /// Total wallet balance immediately after the reserve-time deduction.
    pub balance_after: i64,

    /// What the reservation pays for.
    pub source: SourceRef,

    /// Additional context (job parameters, request IDs).
    pub metadata: serde_json::Value,

    /// When the reservation was created.
    pub created_at: DateTime<Utc>,

    /// When the reservation was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a new reservation in the `Reserved` state.
    #[must_use]
    pub fn new(
        user_id: UserId,
        cost: i64,
        balance_after: i64,
        source: SourceRef,
        metadata: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReservationId::generate(),
            user_id,
            status: ReservationStatus::Reserved,
            cost,
            balance_after,
            source,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether capture or release has already acted on this reservation.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge extra metadata into the reservation's metadata object.
    ///
    /// Non-object existing metadata is replaced wholesale.
    pub fn merge_metadata(&mut self, extra: serde_json::Value) {
        match (&mut self.metadata, extra) {
            (serde_json::Value::Object(existing), serde_json::Value::Object(incoming)) => {
                existing.extend(incoming);
            }
            (_, serde_json::Value::Null) => {}
            (slot, incoming) => *slot = incoming,
        }
    }
}
