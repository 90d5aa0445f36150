//! The top-up and refund path.
//!
//! Both purchases and refunds credit the perpetual pool. Refunds land there
//! regardless of which pool funded the original debit: top-up credits never
//! expire, so the approximation is slightly user-favorable, and the original
//! pool is kept in the entry metadata for audit.

use chrono::Utc;

use credit_ledger_core::{
    LedgerEntry, LedgerError, Pool, Result, SourceKind, SourceRef, UserId,
};
use credit_ledger_store::{Store, WalletCommit};

use crate::CreditLedger;

impl<S: Store> CreditLedger<S> {
    /// Add purchased credits to the top-up pool.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`.
    pub fn add_top_up_credits(
        &self,
        user_id: UserId,
        amount: i64,
        source_id: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        let source = match source_id {
            Some(id) => SourceRef::new(SourceKind::Purchase, id),
            None => SourceRef::bare(SourceKind::Purchase),
        };
        let entry = LedgerEntry::credit(
            user_id,
            Pool::TopUp,
            amount,
            wallet.top_up_credits,
            source,
            description.unwrap_or_else(|| format!("Top-up of {amount} credits")),
        );

        wallet.top_up_credits += amount;
        wallet.updated_at = Utc::now();

        self.store
            .commit(&WalletCommit::new(wallet).with_entries(vec![entry]))?;

        tracing::info!(user_id = %user_id, amount, "added top-up credits");

        Ok(())
    }

    /// Refund credits into the top-up pool.
    ///
    /// `original_pool` names the pool the refunded debit came from; it is
    /// recorded in the entry metadata only and never receives the credits.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `amount <= 0`.
    pub fn refund_credits(
        &self,
        user_id: UserId,
        amount: i64,
        original_pool: Pool,
        reason: &str,
        source_id: Option<String>,
    ) -> Result<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        let source = match source_id {
            Some(id) => SourceRef::new(SourceKind::Refund, id),
            None => SourceRef::bare(SourceKind::Refund),
        };
        let entry = LedgerEntry::refund(
            user_id,
            amount,
            wallet.top_up_credits,
            source,
            reason.to_string(),
            serde_json::json!({ "original_pool": original_pool.as_str() }),
        );

        wallet.top_up_credits += amount;
        wallet.updated_at = Utc::now();

        self.store
            .commit(&WalletCommit::new(wallet).with_entries(vec![entry]))?;

        tracing::info!(
            user_id = %user_id,
            amount,
            original_pool = original_pool.as_str(),
            reason,
            "refunded credits"
        );

        Ok(())
    }
}
