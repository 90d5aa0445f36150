//! Billing-cycle operations, invoked by the billing collaborator on
//! subscription lifecycle webhooks.
//!
//! Webhooks are delivered at least once and may arrive concurrently or out
//! of order; renewal resets therefore claim a billing-period idempotency key
//! inside the same commit as the balance overwrite, so a duplicate delivery
//! is rejected by the store rather than by application logic racing a read.

use chrono::{DateTime, Utc};

use credit_ledger_core::{LedgerEntry, LedgerError, Pool, Result, SourceKind, SourceRef, UserId};
use credit_ledger_store::{BillingPeriod, Store, StoreError, WalletCommit};

use crate::CreditLedger;

impl<S: Store> CreditLedger<S> {
    /// First-time subscription grant.
    ///
    /// Sets `subscription_credits = credits` on a wallet that has never held
    /// subscription credits.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `credits <= 0`.
    /// - [`LedgerError::AlreadyGranted`] if the wallet already holds
    ///   subscription credits; renewals go through
    ///   [`CreditLedger::reset_subscription_credits`].
    pub fn grant_initial_subscription_credits(
        &self,
        user_id: UserId,
        credits: i64,
        expires_at: DateTime<Utc>,
        source_id: Option<String>,
    ) -> Result<()> {
        if credits <= 0 {
            return Err(LedgerError::InvalidAmount { amount: credits });
        }

        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        if wallet.subscription_credits > 0 {
            return Err(LedgerError::AlreadyGranted {
                user_id: user_id.to_string(),
            });
        }

        let source = source_ref(SourceKind::Subscription, source_id);
        let entry = LedgerEntry::credit(
            user_id,
            Pool::Subscription,
            credits,
            wallet.subscription_credits,
            source,
            "Initial subscription credit grant".into(),
        );

        wallet.subscription_credits = credits;
        wallet.subscription_expires_at = Some(expires_at);
        wallet.updated_at = Utc::now();

        self.store
            .commit(&WalletCommit::new(wallet).with_entries(vec![entry]))?;

        tracing::info!(
            user_id = %user_id,
            credits,
            expires_at = %expires_at,
            "granted initial subscription credits"
        );

        Ok(())
    }

    /// Renewal reset: overwrite `subscription_credits` with the plan limit.
    ///
    /// This is a reset, not an addition; unused prior credits are forfeited
    /// and recorded in the RESET entry's metadata. When `source_id` names
    /// the subscription, the reset claims a `(subscription, expires_at)`
    /// idempotency key: a duplicate webhook delivery for the same renewal
    /// logs a warning and leaves the wallet untouched.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if `plan_limit <= 0`.
    pub fn reset_subscription_credits(
        &self,
        user_id: UserId,
        plan_limit: i64,
        expires_at: DateTime<Utc>,
        source_id: Option<String>,
    ) -> Result<()> {
        if plan_limit <= 0 {
            return Err(LedgerError::InvalidAmount { amount: plan_limit });
        }

        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        let forfeited = wallet.subscription_credits;

        let source = source_ref(SourceKind::Subscription, source_id.clone());
        let entry = LedgerEntry::reset(
            user_id,
            plan_limit,
            forfeited,
            source,
            "Subscription renewal reset".into(),
        );

        wallet.subscription_credits = plan_limit;
        wallet.subscription_expires_at = Some(expires_at);
        wallet.updated_at = Utc::now();

        let mut commit = WalletCommit::new(wallet).with_entries(vec![entry]);
        if let Some(subscription_id) = source_id {
            commit = commit.with_billing_period(BillingPeriod {
                subscription_id,
                period: expires_at.to_rfc3339(),
            });
        }

        match self.store.commit(&commit) {
            Err(StoreError::DuplicatePeriod {
                subscription_id,
                period,
            }) => {
                tracing::warn!(
                    user_id = %user_id,
                    subscription_id,
                    period,
                    "duplicate renewal delivery ignored"
                );
                return Ok(());
            }
            other => other?,
        }

        tracing::info!(
            user_id = %user_id,
            plan_limit,
            forfeited,
            expires_at = %expires_at,
            "reset subscription credits"
        );

        Ok(())
    }

    /// Revoke subscription credits after a failed renewal payment.
    ///
    /// Zeroes the subscription pool and clears the expiry. No-op when the
    /// pool is already empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn revoke_subscription_credits(&self, user_id: UserId, reason: &str) -> Result<()> {
        let _guard = self.locks.lock(&user_id);

        let Some(mut wallet) = self.store.get_wallet(&user_id)? else {
            tracing::debug!(user_id = %user_id, "revoke on missing wallet is a no-op");
            return Ok(());
        };
        if wallet.subscription_credits == 0 && wallet.subscription_expires_at.is_none() {
            tracing::debug!(user_id = %user_id, "revoke on empty subscription pool is a no-op");
            return Ok(());
        }

        let revoked = wallet.subscription_credits;
        let entry = LedgerEntry::reset(
            user_id,
            0,
            revoked,
            SourceRef::bare(SourceKind::Subscription),
            format!("Subscription credits revoked: {reason}"),
        );

        wallet.subscription_credits = 0;
        wallet.subscription_expires_at = None;
        wallet.updated_at = Utc::now();

        self.store
            .commit(&WalletCommit::new(wallet).with_entries(vec![entry]))?;

        tracing::info!(
            user_id = %user_id,
            revoked,
            reason,
            "revoked subscription credits"
        );

        Ok(())
    }
}

fn source_ref(kind: SourceKind, id: Option<String>) -> SourceRef {
    match id {
        Some(id) => SourceRef::new(kind, id),
        None => SourceRef::bare(kind),
    }
}
