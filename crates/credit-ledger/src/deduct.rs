//! The deduction operation: subscription pool first, then top-up, then grace.

use chrono::Utc;

use credit_ledger_core::{
    deduction, DeductOutcome, LedgerEntry, Pool, Result, SourceRef, UserId, Wallet,
};
use credit_ledger_store::{Store, WalletCommit};

use crate::CreditLedger;

impl<S: Store> CreditLedger<S> {
    /// Deduct `cost` credits from the user's wallet.
    ///
    /// Deduction order is fixed: subscription credits, then top-up credits,
    /// then the grace allowance. One DEBIT entry is appended per nonzero
    /// pool deduction, plus a balance-neutral grace entry when grace was
    /// consumed.
    ///
    /// # Errors
    ///
    /// - [`credit_ledger_core::LedgerError::InvalidAmount`] if `cost <= 0`.
    /// - [`credit_ledger_core::LedgerError::InsufficientCredits`] if both
    ///   pools plus grace cannot cover `cost`; nothing is mutated.
    pub fn deduct_credits(
        &self,
        user_id: UserId,
        cost: i64,
        source: SourceRef,
        description: Option<String>,
    ) -> Result<DeductOutcome> {
        let _guard = self.locks.lock(&user_id);

        let mut wallet = self.wallet_for_update(user_id)?;
        let (outcome, entries) = apply_deduction(&mut wallet, cost, &source, description)?;

        self.store
            .commit(&WalletCommit::new(wallet).with_entries(entries))?;

        tracing::info!(
            user_id = %user_id,
            cost,
            subscription_deducted = outcome.subscription_deducted,
            top_up_deducted = outcome.top_up_deducted,
            source = source.kind.as_str(),
            "deducted credits"
        );

        Ok(outcome)
    }
}

/// Apply a planned deduction to the wallet in memory and build the ledger
/// entries describing it. The caller persists both in one commit.
pub(crate) fn apply_deduction(
    wallet: &mut Wallet,
    cost: i64,
    source: &SourceRef,
    description: Option<String>,
) -> Result<(DeductOutcome, Vec<LedgerEntry>)> {
    let plan = deduction::plan_for_wallet(wallet, cost)?;
    let description =
        description.unwrap_or_else(|| format!("{} usage", source.kind.as_str()));

    let mut entries = Vec::with_capacity(3);

    if plan.subscription_deducted > 0 {
        entries.push(LedgerEntry::debit(
            wallet.user_id,
            Pool::Subscription,
            plan.subscription_deducted,
            wallet.subscription_credits,
            source.clone(),
            description.clone(),
        ));
        wallet.subscription_credits -= plan.subscription_deducted;
    }

    if plan.top_up_deducted > 0 {
        entries.push(LedgerEntry::debit(
            wallet.user_id,
            Pool::TopUp,
            plan.top_up_deducted,
            wallet.top_up_credits,
            source.clone(),
            description.clone(),
        ));
        wallet.top_up_credits -= plan.top_up_deducted;
    }

    if plan.grace_used > 0 {
        entries.push(LedgerEntry::grace(
            wallet.user_id,
            plan.grace_used,
            wallet.top_up_credits,
            source.clone(),
            format!("{description} (grace)"),
        ));
        wallet.grace_limit -= plan.grace_used;
        wallet.grace_used += plan.grace_used;
    }

    wallet.updated_at = Utc::now();

    let outcome = DeductOutcome {
        subscription_deducted: plan.subscription_deducted,
        top_up_deducted: plan.top_up_deducted,
        total_deducted: cost,
        new_subscription_balance: wallet.subscription_credits,
        new_top_up_balance: wallet.top_up_credits,
    };

    Ok((outcome, entries))
}
