//! Wallet types for the credit ledger.
//!
//! A wallet holds the two credit pools plus the grace overdraft allowance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A dual-pool credit wallet, one per user.
///
/// Invariant: `subscription_credits`, `top_up_credits`, `grace_limit` and
/// `grace_used` are always >= 0. Grace consumption moves allowance from
/// `grace_limit` to `grace_used`; it never drives a pool negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// The owning user.
    pub user_id: UserId,

    /// Expiring pool, granted per billing period and reset at renewal.
    pub subscription_credits: i64,

    /// Perpetual pool, purchased ad hoc; also the universal refund target.
    pub top_up_credits: i64,

    /// When the current subscription grant expires, if any.
    pub subscription_expires_at: Option<DateTime<Utc>>,

    /// Remaining overdraft allowance.
    pub grace_limit: i64,

    /// Cumulative grace consumed. Monotonically non-decreasing.
    pub grace_used: i64,

    /// When the wallet was created.
    pub created_at: DateTime<Utc>,

    /// When the wallet was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with empty pools.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            subscription_credits: 0,
            top_up_credits: 0,
            subscription_expires_at: None,
            grace_limit: 0,
            grace_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a wallet seeded from a migrated legacy balance.
    ///
    /// Legacy single-number balances land in the perpetual pool since their
    /// provenance is unknown and top-up credits never expire.
    #[must_use]
    pub fn from_legacy_balance(user_id: UserId, legacy_credits: i64) -> Self {
        let mut wallet = Self::new(user_id);
        wallet.top_up_credits = legacy_credits.max(0);
        wallet
    }

    /// Sum of both pools. Excludes grace, which is a loan rather than a
    /// balance.
    #[must_use]
    pub const fn total_credits(&self) -> i64 {
        self.subscription_credits + self.top_up_credits
    }

    /// Check whether a deduction of `cost` would succeed, grace included.
    #[must_use]
    pub const fn can_cover(&self, cost: i64) -> bool {
        self.total_credits() + self.grace_limit >= cost
    }

    /// Read-only balance view.
    #[must_use]
    pub fn balance(&self) -> WalletBalance {
        WalletBalance {
            subscription_credits: self.subscription_credits,
            top_up_credits: self.top_up_credits,
            total_credits: self.total_credits(),
            subscription_expires_at: self.subscription_expires_at,
            grace_limit: self.grace_limit,
        }
    }
}

/// A point-in-time view of a wallet's balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Expiring pool balance.
    pub subscription_credits: i64,

    /// Perpetual pool balance.
    pub top_up_credits: i64,

    /// Sum of both pools.
    pub total_credits: i64,

    /// When the subscription grant expires, if any.
    pub subscription_expires_at: Option<DateTime<Utc>>,

    /// Remaining overdraft allowance.
    pub grace_limit: i64,
}
