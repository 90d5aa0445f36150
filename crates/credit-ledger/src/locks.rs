//! Per-user serialization of wallet mutations.
//!
//! The store commits atomically but does not serialize concurrent
//! read-modify-write sequences; without this registry two concurrent debits
//! could both read the same balance and one update would be lost.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use credit_ledger_core::UserId;

/// A registry of one mutex per user.
///
/// Lock cells are created on first use and kept for the lifetime of the
/// ledger. The registry mutex is held only long enough to fetch or insert a
/// cell, never across a wallet operation.
#[derive(Default)]
pub(crate) struct UserLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Acquire the lock for a user, blocking until it is free.
    pub(crate) fn lock(&self, user_id: &UserId) -> ArcMutexGuard<RawMutex, ()> {
        let cell = {
            let mut map = self.inner.lock();
            Arc::clone(map.entry(*user_id).or_default())
        };
        cell.lock_arc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_user_gets_same_cell() {
        let locks = UserLocks::default();
        let user_id = UserId::generate();

        drop(locks.lock(&user_id));

        let map = locks.inner.lock();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&user_id));
    }

    #[test]
    fn lock_serializes_critical_sections() {
        let locks = Arc::new(UserLocks::default());
        let user_id = UserId::generate();
        let counter = Arc::new(Mutex::new(0i64));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = locks.lock(&user_id);
                        let current = *counter.lock();
                        *counter.lock() = current + 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*counter.lock(), 800);
    }
}
