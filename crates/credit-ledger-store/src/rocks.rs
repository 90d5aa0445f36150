//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use credit_ledger_core::{EntryId, LedgerEntry, Reservation, ReservationId, UserId, Wallet};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Store, WalletCommit};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Wallet Operations
    // =========================================================================

    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>> {
        let cf = self.cf(cf::WALLETS)?;
        let key = keys::wallet_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_legacy_balance(&self, user_id: &UserId) -> Result<Option<i64>> {
        let cf = self.cf(cf::LEGACY_BALANCES)?;
        let key = keys::legacy_balance_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_legacy_balance(&self, user_id: &UserId, balance: i64) -> Result<()> {
        let cf = self.cf(cf::LEGACY_BALANCES)?;
        let key = keys::legacy_balance_key(user_id);
        let value = Self::serialize(&balance)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Ledger Entry Operations
    // =========================================================================

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::ENTRIES)?;
        let key = keys::entry_key(entry_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let cf_by_user = self.cf(cf::ENTRIES_BY_USER)?;
        let prefix = keys::user_entries_prefix(user_id);

        let mut entries = Vec::new();
        let mut skipped = 0;

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect all matching keys first (ULIDs are naturally time-ordered)
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        // Reverse to get newest first
        all_keys.reverse();

        for key in all_keys {
            if skipped < offset {
                skipped += 1;
                continue;
            }

            if entries.len() >= limit {
                break;
            }

            let entry_id = keys::extract_entry_id_from_user_key(&key);
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    // =========================================================================
    // Reservation Operations
    // =========================================================================

    fn get_reservation(&self, reservation_id: &ReservationId) -> Result<Option<Reservation>> {
        let cf = self.cf(cf::RESERVATIONS)?;
        let key = keys::reservation_key(reservation_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Billing Period Operations
    // =========================================================================

    fn has_billing_period(&self, subscription_id: &str, period: &str) -> Result<bool> {
        let cf = self.cf(cf::BILLING_PERIODS)?;
        let key = keys::billing_period_key(subscription_id, period);

        let exists = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();

        Ok(exists)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn commit(&self, commit: &WalletCommit) -> Result<()> {
        // Claim the billing-period marker first: a duplicate renewal
        // delivery must reject the whole mutation before anything lands.
        if let Some(period) = &commit.billing_period {
            if self.has_billing_period(&period.subscription_id, &period.period)? {
                return Err(StoreError::DuplicatePeriod {
                    subscription_id: period.subscription_id.clone(),
                    period: period.period.clone(),
                });
            }
        }

        let cf_wallets = self.cf(cf::WALLETS)?;
        let cf_entries = self.cf(cf::ENTRIES)?;
        let cf_by_user = self.cf(cf::ENTRIES_BY_USER)?;
        let cf_legacy = self.cf(cf::LEGACY_BALANCES)?;

        let user_id = commit.wallet.user_id;
        let wallet_key = keys::wallet_key(&user_id);
        let wallet_value = Self::serialize(&commit.wallet)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_wallets, &wallet_key, &wallet_value);

        for entry in &commit.entries {
            let entry_key = keys::entry_key(&entry.id);
            let user_entry_key = keys::user_entry_key(&user_id, &entry.id);
            let entry_value = Self::serialize(entry)?;

            batch.put_cf(&cf_entries, &entry_key, &entry_value);
            batch.put_cf(&cf_by_user, &user_entry_key, []); // Index entry (empty value)
        }

        if let Some(reservation) = &commit.reservation {
            let cf_reservations = self.cf(cf::RESERVATIONS)?;
            let reservation_key = keys::reservation_key(&reservation.id);
            let reservation_value = Self::serialize(reservation)?;
            batch.put_cf(&cf_reservations, &reservation_key, &reservation_value);
        }

        if let Some(period) = &commit.billing_period {
            let cf_periods = self.cf(cf::BILLING_PERIODS)?;
            let period_key = keys::billing_period_key(&period.subscription_id, &period.period);
            batch.put_cf(&cf_periods, &period_key, []); // Presence only
        }

        // Legacy mirror: always derived from the wallet inside the batch.
        let legacy_key = keys::legacy_balance_key(&user_id);
        let legacy_value = Self::serialize(&commit.wallet.total_credits())?;
        batch.put_cf(&cf_legacy, &legacy_key, &legacy_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            user_id = %user_id,
            entries = commit.entries.len(),
            reservation = commit.reservation.is_some(),
            "committed wallet mutation"
        );

        Ok(())
    }
}
