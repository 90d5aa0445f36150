//! The pure two-pool-plus-grace deduction algorithm.
//!
//! Deduction order is fixed: subscription credits first (they expire), then
//! top-up credits, then the grace allowance. The planner is side-effect free;
//! persisting the resulting plan is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::Wallet;

/// How a deduction splits across the pools and grace.
///
/// Invariant: `subscription_deducted + top_up_deducted + grace_used == cost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPlan {
    /// Credits taken from the subscription pool.
    pub subscription_deducted: i64,

    /// Credits taken from the top-up pool.
    pub top_up_deducted: i64,

    /// Grace allowance consumed to cover the remainder.
    pub grace_used: i64,
}

impl DeductionPlan {
    /// Total credits this plan covers.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.subscription_deducted + self.top_up_deducted + self.grace_used
    }
}

/// The result of a persisted deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductOutcome {
    /// Credits taken from the subscription pool.
    pub subscription_deducted: i64,

    /// Credits taken from the top-up pool.
    pub top_up_deducted: i64,

    /// Total deducted, always equal to the requested cost.
    pub total_deducted: i64,

    /// Subscription pool balance after the deduction.
    pub new_subscription_balance: i64,

    /// Top-up pool balance after the deduction.
    pub new_top_up_balance: i64,
}

/// Plan a deduction of `cost` against the given pool balances.
///
/// # Errors
///
/// - [`LedgerError::InvalidAmount`] if `cost <= 0`.
/// - [`LedgerError::InsufficientCredits`] if both pools plus grace cannot
///   cover `cost`. The reported `available` figure is the pool sum only;
///   grace participates in the accept/reject decision but stays invisible
///   to the caller.
pub fn plan(subscription: i64, top_up: i64, grace_limit: i64, cost: i64) -> Result<DeductionPlan> {
    if cost <= 0 {
        return Err(LedgerError::InvalidAmount { amount: cost });
    }

    let subscription_deducted = subscription.min(cost);
    let mut remaining = cost - subscription_deducted;

    let top_up_deducted = top_up.min(remaining);
    remaining -= top_up_deducted;

    if remaining > grace_limit {
        return Err(LedgerError::InsufficientCredits {
            required: cost,
            available: subscription + top_up,
        });
    }

    Ok(DeductionPlan {
        subscription_deducted,
        top_up_deducted,
        grace_used: remaining,
    })
}

/// Plan a deduction against a wallet's current balances.
///
/// # Errors
///
/// Same as [`plan`].
pub fn plan_for_wallet(wallet: &Wallet, cost: i64) -> Result<DeductionPlan> {
    plan(
        wallet.subscription_credits,
        wallet.top_up_credits,
        wallet.grace_limit,
        cost,
    )
}
