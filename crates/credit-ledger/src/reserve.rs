//! The reserve/capture/release protocol.
//!
//! Reservations are pessimistic: credits leave the wallet at reserve time,
//! not at capture time. Capture keeps the debit; release refunds it into the
//! top-up pool. Both are idempotent against already-settled reservations.

use chrono::Utc;

use credit_ledger_core::{
    reservation::RELEASE_REASON_METADATA_KEY, LedgerEntry, LedgerError, Reservation,
    ReservationId, Result, SourceKind, SourceRef, UserId,
};
use credit_ledger_store::{Store, WalletCommit};

use crate::deduct::apply_deduction;
use crate::CreditLedger;

/// The handle returned by a successful reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationReceipt {
    /// The reservation to later capture or release.
    pub reservation_id: ReservationId,

    /// Total wallet balance immediately after the reserve-time deduction.
    pub balance_after: i64,
}

impl<S: Store> CreditLedger<S> {
    /// Reserve `cost` credits for asynchronous work.
    ///
    /// The deduction happens immediately; the reservation row and the debit
    /// land in one commit. The caller finalizes with
    /// [`CreditLedger::capture`] or [`CreditLedger::release`].
    ///
    /// # Errors
    ///
    /// Same as [`CreditLedger::deduct_credits`].
    pub fn reserve(
        &self,
        user_id: UserId,
        cost: i64,
        source: SourceRef,
        metadata: serde_json::Value,
    ) -> Result<ReservationReceipt> {
        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        let (outcome, entries) = apply_deduction(&mut wallet, cost, &source, None)?;
        let balance_after = outcome.new_subscription_balance + outcome.new_top_up_balance;

        let reservation = Reservation::new(user_id, cost, balance_after, source, metadata);
        let reservation_id = reservation.id;

        self.store.commit(
            &WalletCommit::new(wallet)
                .with_entries(entries)
                .with_reservation(reservation),
        )?;

        tracing::info!(
            user_id = %user_id,
            reservation_id = %reservation_id,
            cost,
            balance_after,
            "reserved credits"
        );

        Ok(ReservationReceipt {
            reservation_id,
            balance_after,
        })
    }

    /// Finalize a reservation after the work succeeded.
    ///
    /// No balance mutation occurs; the debit already happened at reserve
    /// time. Idempotent: a settled reservation is a no-op.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ReservationNotFound`] if the ID is unknown.
    pub fn capture(
        &self,
        reservation_id: &ReservationId,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        let user_id = self.reservation_owner(reservation_id)?;
        let _guard = self.locks.lock(&user_id);

        // Re-read under the lock; a concurrent release may have settled it.
        let mut reservation = self.require_reservation(reservation_id)?;
        if reservation.is_settled() {
            tracing::warn!(
                reservation_id = %reservation_id,
                status = ?reservation.status,
                "capture on settled reservation is a no-op"
            );
            return Ok(());
        }

        reservation.status = credit_ledger_core::ReservationStatus::Completed;
        if let Some(extra) = metadata {
            reservation.merge_metadata(extra);
        }
        reservation.updated_at = Utc::now();

        let wallet = self
            .store
            .get_wallet(&user_id)?
            .ok_or_else(|| LedgerError::WalletNotFound {
                user_id: user_id.to_string(),
            })?;

        self.store
            .commit(&WalletCommit::new(wallet).with_reservation(reservation))?;

        tracing::info!(
            user_id = %user_id,
            reservation_id = %reservation_id,
            "captured reservation"
        );

        Ok(())
    }

    /// Cancel a reservation after the work failed, refunding its cost.
    ///
    /// The refund always lands in the top-up pool regardless of which pools
    /// funded the original debit. Only `Reserved` rows act; a settled
    /// reservation is a no-op, so a release retried after a crash cannot
    /// refund twice.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ReservationNotFound`] if the ID is unknown.
    pub fn release(&self, reservation_id: &ReservationId, reason: &str) -> Result<()> {
        let user_id = self.reservation_owner(reservation_id)?;
        let _guard = self.locks.lock(&user_id);

        let mut reservation = self.require_reservation(reservation_id)?;
        if reservation.is_settled() {
            tracing::warn!(
                reservation_id = %reservation_id,
                status = ?reservation.status,
                "release on settled reservation is a no-op"
            );
            return Ok(());
        }

        let mut wallet = self
            .store
            .get_wallet(&user_id)?
            .ok_or_else(|| LedgerError::WalletNotFound {
                user_id: user_id.to_string(),
            })?;

        let entry = LedgerEntry::refund(
            user_id,
            reservation.cost,
            wallet.top_up_credits,
            SourceRef::new(SourceKind::Refund, reservation_id.to_string()),
            format!("Released reservation: {reason}"),
            serde_json::json!({ RELEASE_REASON_METADATA_KEY: reason }),
        );
        wallet.top_up_credits += reservation.cost;
        wallet.updated_at = Utc::now();

        reservation.status = credit_ledger_core::ReservationStatus::Cancelled;
        reservation.merge_metadata(serde_json::json!({ RELEASE_REASON_METADATA_KEY: reason }));
        reservation.updated_at = Utc::now();

        let cost = reservation.cost;
        self.store.commit(
            &WalletCommit::new(wallet)
                .with_entries(vec![entry])
                .with_reservation(reservation),
        )?;

        tracing::info!(
            user_id = %user_id,
            reservation_id = %reservation_id,
            refunded = cost,
            reason,
            "released reservation"
        );

        Ok(())
    }

    /// Resolve the owning user before taking their lock.
    fn reservation_owner(&self, reservation_id: &ReservationId) -> Result<UserId> {
        Ok(self.require_reservation(reservation_id)?.user_id)
    }

    fn require_reservation(&self, reservation_id: &ReservationId) -> Result<Reservation> {
        self.store
            .get_reservation(reservation_id)?
            .ok_or_else(|| LedgerError::ReservationNotFound {
                reservation_id: reservation_id.to_string(),
            })
    }
}
