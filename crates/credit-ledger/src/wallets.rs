//! Wallet access: lazy creation, legacy migration, and read-only views.

use credit_ledger_core::{
    LedgerEntry, Reservation, ReservationId, Result, UserId, Wallet, WalletBalance,
};
use credit_ledger_store::{Store, WalletCommit};

use crate::CreditLedger;

impl<S: Store> CreditLedger<S> {
    /// Get the user's wallet, creating it on first access.
    ///
    /// Creation migrates any pre-existing legacy single-number balance into
    /// the top-up pool. Safe to call concurrently for the same user: the
    /// per-user lock makes the second caller read the wallet the first one
    /// created.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let _guard = self.locks.lock(&user_id);

        if let Some(wallet) = self.store.get_wallet(&user_id)? {
            return Ok(wallet);
        }

        let wallet = self.migrated_wallet(user_id)?;
        self.store.commit(&WalletCommit::new(wallet.clone()))?;

        tracing::info!(
            user_id = %user_id,
            migrated_credits = wallet.top_up_credits,
            "created wallet"
        );

        Ok(wallet)
    }

    /// Read-only balance view. Does not create a wallet; a missing wallet
    /// reads as its would-be migrated state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get_balance(&self, user_id: UserId) -> Result<WalletBalance> {
        match self.store.get_wallet(&user_id)? {
            Some(wallet) => Ok(wallet.balance()),
            None => Ok(self.migrated_wallet(user_id)?.balance()),
        }
    }

    /// Pre-flight check: can a deduction of `cost` succeed, grace included?
    ///
    /// Read-only; callers that want the deduction should call
    /// [`CreditLedger::deduct_credits`] directly and handle the error, since
    /// the balance may change between check and act.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn has_credits(&self, user_id: UserId, cost: i64) -> Result<bool> {
        match self.store.get_wallet(&user_id)? {
            Some(wallet) => Ok(wallet.can_cover(cost)),
            None => Ok(self.migrated_wallet(user_id)?.can_cover(cost)),
        }
    }

    /// List the user's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get_transaction_history(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.list_entries_by_user(&user_id, limit, 0)?)
    }

    /// Read a reservation's current state.
    ///
    /// Read-only; this is the surface the external reconciliation process
    /// uses to find reservations that exceeded its age threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get_reservation(&self, reservation_id: &ReservationId) -> Result<Option<Reservation>> {
        Ok(self.store.get_reservation(reservation_id)?)
    }

    /// Set the remaining grace allowance for a user (operator adjustment).
    ///
    /// Grace is a loan rather than a pool balance, so no ledger entry is
    /// appended; consumption is still visible through the balance-neutral
    /// grace entries the deduction path writes.
    ///
    /// # Errors
    ///
    /// [`credit_ledger_core::LedgerError::InvalidAmount`] if `grace_limit`
    /// is negative.
    pub fn set_grace_limit(&self, user_id: UserId, grace_limit: i64) -> Result<()> {
        if grace_limit < 0 {
            return Err(credit_ledger_core::LedgerError::InvalidAmount {
                amount: grace_limit,
            });
        }

        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        wallet.grace_limit = grace_limit;
        wallet.updated_at = chrono::Utc::now();

        self.store.commit(&WalletCommit::new(wallet))?;

        tracing::info!(user_id = %user_id, grace_limit, "set grace limit");

        Ok(())
    }

    /// Build the wallet state a new user starts with, seeding the top-up
    /// pool from any legacy balance. Not persisted.
    pub(crate) fn migrated_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let legacy = self.store.get_legacy_balance(&user_id)?.unwrap_or(0);
        Ok(Wallet::from_legacy_balance(user_id, legacy))
    }

    /// Load the wallet for a mutation, creating the in-memory migrated state
    /// if none exists yet. The caller holds the user lock and persists the
    /// wallet as part of its own commit.
    pub(crate) fn wallet_for_update(&self, user_id: UserId) -> Result<Wallet> {
        match self.store.get_wallet(&user_id)? {
            Some(wallet) => Ok(wallet),
            None => self.migrated_wallet(user_id),
        }
    }
}
