//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use credit_ledger_core::{EntryId, ReservationId, UserId};

/// Create a wallet key from a user ID.
#[must_use]
pub fn wallet_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`
///
/// Since ULIDs are time-ordered, entries for a user will be sorted by time.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all ledger entries for a user.
#[must_use]
pub fn user_entries_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a reservation key from a reservation ID.
#[must_use]
pub fn reservation_key(reservation_id: &ReservationId) -> Vec<u8> {
    reservation_id.to_bytes().to_vec()
}

/// Create a legacy balance key from a user ID.
#[must_use]
pub fn legacy_balance_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a billing-period idempotency key.
///
/// Format: `subscription_id || 0x00 || period token` (e.g. the RFC 3339
/// period end). One key per renewal; a second delivery of the same renewal
/// produces the same key.
#[must_use]
pub fn billing_period_key(subscription_id: &str, period: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(subscription_id.len() + 1 + period.len());
    key.extend_from_slice(subscription_id.as_bytes());
    key.push(0);
    key.extend_from_slice(period.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_key_length() {
        let user_id = UserId::generate();
        let key = wallet_key(&user_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn entry_key_length() {
        let entry_id = EntryId::generate();
        let key = entry_key(&entry_id);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn user_entry_key_format() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = user_entry_key(&user_id, &entry_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], entry_id.to_bytes());
    }

    #[test]
    fn extract_entry_id_roundtrip() {
        let user_id = UserId::generate();
        let entry_id = EntryId::generate();
        let key = user_entry_key(&user_id, &entry_id);

        let extracted = extract_entry_id_from_user_key(&key);
        assert_eq!(extracted, entry_id);
    }

    #[test]
    fn billing_period_key_distinguishes_periods() {
        let a = billing_period_key("sub_1", "2026-09-01T00:00:00Z");
        let b = billing_period_key("sub_1", "2026-10-01T00:00:00Z");
        let c = billing_period_key("sub_2", "2026-09-01T00:00:00Z");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, billing_period_key("sub_1", "2026-09-01T00:00:00Z"));
    }
}
