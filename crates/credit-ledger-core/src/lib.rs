//! Core types and the deduction algorithm for the dual-wallet credit ledger.
//!
//! This crate provides the foundational types used throughout the ledger:
//!
//! - **Identifiers**: `UserId`, `EntryId`, `ReservationId`
//! - **Wallets**: `Wallet`, `WalletBalance`
//! - **Ledger**: `LedgerEntry`, `Pool`, `EntryKind`
//! - **Reservations**: `Reservation`, `ReservationStatus`
//! - **Deduction**: the pure two-pool-plus-grace deduction planner
//!
//! # Credit model
//!
//! A credit is the abstract unit of consumption: one credit pays for roughly
//! one billable operation. Every user holds two pools:
//!
//! - **Subscription credits** are granted per billing period and overwritten
//!   (not accumulated) at each renewal; unused credits are forfeited.
//! - **Top-up credits** are purchased ad hoc and never expire. They are also
//!   the universal refund target.
//!
//! A bounded, non-replenishing **grace** allowance lets a debit succeed when
//! both pools are exhausted. Grace is a bookkeeping loan, not a pool balance:
//! consuming it never drives a stored balance below zero.
//!
//! Amounts are stored as `i64` whole credits to avoid floating point issues.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod deduction;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod reservation;
pub mod source;
pub mod wallet;

pub use deduction::{DeductOutcome, DeductionPlan};
pub use error::{LedgerError, Result};
pub use ids::{EntryId, IdError, ReservationId, UserId};
pub use ledger::{EntryKind, LedgerEntry, Pool};
pub use reservation::{Reservation, ReservationStatus};
pub use source::{SourceKind, SourceRef};
pub use wallet::{Wallet, WalletBalance};
