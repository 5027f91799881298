//! Thread-safe in-memory account store
//!
//! # Design
//!
//! Each account lives in its own slot: an `Arc<parking_lot::Mutex<Option<Account>>>`
//! held in a `DashMap`. The map only hands out slots; all reads and writes of
//! account state happen under the slot's mutex. A DashMap reference is never
//! held while waiting on a slot, so shard locks and slot locks are never
//! nested in the opposite order.
//!
//! Lock waits are bounded by `lock_timeout`. When the wait expires the
//! operation fails with `LockTimeout` and nothing is mutated.
//!
//! Deleting an account leaves `None` in its slot before the slot is removed
//! from the map. A caller that obtained the slot earlier and acquires it after
//! the delete sees `AccountNotFound` rather than the deleted record.
//!
//! # Thread Safety
//!
//! Operations on different accounts proceed in parallel. Operations on the
//! same account serialize on its slot. `update_pair` acquires the two slots in
//! argument order and does not sort them.

use crate::config::DEFAULT_LOCK_TIMEOUT;
use crate::core::traits::AccountStore;
use crate::types::{Account, AccountId, LedgerError};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;

type Slot = Arc<Mutex<Option<Account>>>;

/// In-memory implementation of [`AccountStore`]
#[derive(Debug)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, Slot>,
    lock_timeout: Duration,
}

impl InMemoryAccountStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `lock_timeout` - maximum wait for exclusive access to one account
    pub fn new(lock_timeout: Duration) -> Self {
        InMemoryAccountStore {
            accounts: DashMap::new(),
            lock_timeout,
        }
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn slot(&self, id: &AccountId) -> Result<Slot, LedgerError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn lock<'a>(
        &self,
        slot: &'a Slot,
        id: &AccountId,
    ) -> Result<MutexGuard<'a, Option<Account>>, LedgerError> {
        slot.try_lock_for(self.lock_timeout).ok_or_else(|| {
            LedgerError::lock_timeout(id, saturating_millis(self.lock_timeout))
        })
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_id(&self, id: &AccountId) -> Result<Account, LedgerError> {
        let slot = self.slot(id)?;
        let guard = self.lock(&slot, id)?;
        guard.clone().ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn insert(&self, account: Account) -> Result<Account, LedgerError> {
        loop {
            let mut inserted = false;
            let entry = self.accounts.entry(account.id.clone()).or_insert_with(|| {
                inserted = true;
                Arc::new(Mutex::new(Some(account.clone())))
            });
            let slot = Arc::clone(entry.value());
            drop(entry);

            if inserted {
                return Ok(account);
            }

            let guard = self.lock(&slot, &account.id)?;
            if guard.is_some() {
                return Err(LedgerError::duplicate_account(&account.id));
            }
            drop(guard);

            // Tombstone left by a concurrent delete; clear it and retry
            self.accounts
                .remove_if(&account.id, |_, existing| Arc::ptr_eq(existing, &slot));
        }
    }

    fn save(&self, account: &Account) -> Result<Account, LedgerError> {
        let slot = self.slot(&account.id)?;
        let mut guard = self.lock(&slot, &account.id)?;
        let stored = guard
            .as_mut()
            .ok_or_else(|| LedgerError::account_not_found(&account.id))?;
        *stored = account.clone();
        Ok(account.clone())
    }

    fn update<R, F>(&self, id: &AccountId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<R, LedgerError>,
    {
        let slot = self.slot(id)?;
        let mut guard = self.lock(&slot, id)?;
        let stored = guard
            .as_mut()
            .ok_or_else(|| LedgerError::account_not_found(id))?;

        let mut working = stored.clone();
        let result = f(&mut working)?;
        *stored = working;

        Ok(result)
    }

    fn update_pair<R, F>(&self, first: &AccountId, second: &AccountId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Account, &mut Account) -> Result<R, LedgerError>,
    {
        if first == second {
            return Err(LedgerError::store_unavailable(
                "update_pair requires two distinct accounts",
            ));
        }

        let first_slot = self.slot(first)?;
        let second_slot = self.slot(second)?;

        let mut first_guard = self.lock(&first_slot, first)?;
        let mut second_guard = self.lock(&second_slot, second)?;

        let first_stored = first_guard
            .as_mut()
            .ok_or_else(|| LedgerError::account_not_found(first))?;
        let second_stored = second_guard
            .as_mut()
            .ok_or_else(|| LedgerError::account_not_found(second))?;

        let mut first_working = first_stored.clone();
        let mut second_working = second_stored.clone();
        let result = f(&mut first_working, &mut second_working)?;

        *first_stored = first_working;
        *second_stored = second_working;

        Ok(result)
    }

    fn delete<F>(&self, id: &AccountId, precondition: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&Account) -> Result<(), LedgerError>,
    {
        let slot = self.slot(id)?;
        let mut guard = self.lock(&slot, id)?;

        let stored = guard
            .as_ref()
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        precondition(stored)?;

        let removed = guard
            .take()
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        self.accounts
            .remove_if(id, |_, existing| Arc::ptr_eq(existing, &slot));

        Ok(removed)
    }

    fn accounts(&self) -> Vec<Account> {
        let slots: Vec<Slot> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        slots
            .iter()
            .filter_map(|slot| slot.lock().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, Currency};
    use rust_decimal::Decimal;
    use std::thread;

    fn id(n: u8) -> AccountId {
        AccountId::new(format!("ACC{}", n))
    }

    fn store_with(ids: &[u8]) -> InMemoryAccountStore {
        let store = InMemoryAccountStore::default();
        for n in ids {
            store.insert(Account::new(id(*n), Currency::Usd, "owner")).unwrap();
        }
        store
    }

    #[test]
    fn test_find_missing_account() {
        let store = InMemoryAccountStore::default();
        assert_eq!(
            store.find_by_id(&id(1)),
            Err(LedgerError::account_not_found(&id(1)))
        );
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let store = store_with(&[1]);
        let result = store.insert(Account::new(id(1), Currency::Eur, "other"));

        assert_eq!(result, Err(LedgerError::duplicate_account(&id(1))));
        assert_eq!(store.find_by_id(&id(1)).unwrap().currency, Currency::Usd);
    }

    #[test]
    fn test_update_commits_on_success() {
        let store = store_with(&[1]);
        let balance = store
            .update(&id(1), |account| {
                account.balance = Decimal::new(100, 0);
                Ok(account.balance)
            })
            .unwrap();

        assert_eq!(balance, Decimal::new(100, 0));
        assert_eq!(store.find_by_id(&id(1)).unwrap().balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_update_discards_working_copy_on_error() {
        let store = store_with(&[1]);
        let result: Result<(), _> = store.update(&id(1), |account| {
            account.balance = Decimal::new(100, 0);
            Err(LedgerError::store_unavailable("commit failed"))
        });

        assert!(result.is_err());
        assert_eq!(store.find_by_id(&id(1)).unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_update_pair_commits_both_or_neither() {
        let store = store_with(&[1, 2]);

        store
            .update_pair(&id(1), &id(2), |a, b| {
                a.balance = Decimal::new(10, 0);
                b.balance = Decimal::new(20, 0);
                Ok(())
            })
            .unwrap();

        let failed: Result<(), _> = store.update_pair(&id(1), &id(2), |a, b| {
            a.balance = Decimal::ZERO;
            b.balance = Decimal::ZERO;
            Err(LedgerError::store_unavailable("commit failed"))
        });

        assert!(failed.is_err());
        assert_eq!(store.find_by_id(&id(1)).unwrap().balance, Decimal::new(10, 0));
        assert_eq!(store.find_by_id(&id(2)).unwrap().balance, Decimal::new(20, 0));
    }

    #[test]
    fn test_update_pair_requires_distinct_accounts() {
        let store = store_with(&[1]);
        let result = store.update_pair(&id(1), &id(1), |_, _| Ok(()));
        assert!(matches!(result, Err(LedgerError::StoreUnavailable { .. })));
    }

    #[test]
    fn test_delete_honours_precondition() {
        let store = store_with(&[1]);

        let refused = store.delete(&id(1), |account| {
            if account.status == AccountStatus::Closed {
                Ok(())
            } else {
                Err(LedgerError::not_closed(&account.id, "delete"))
            }
        });
        assert!(matches!(refused, Err(LedgerError::NotClosed { .. })));
        assert!(store.find_by_id(&id(1)).is_ok());

        let removed = store.delete(&id(1), |_| Ok(())).unwrap();
        assert_eq!(removed.id, id(1));
        assert!(store.find_by_id(&id(1)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_identifier_can_be_reused_after_delete() {
        let store = store_with(&[1]);
        store.delete(&id(1), |_| Ok(())).unwrap();

        store.insert(Account::new(id(1), Currency::Gbp, "new")).unwrap();
        assert_eq!(store.find_by_id(&id(1)).unwrap().currency, Currency::Gbp);
    }

    #[test]
    fn test_save_overwrites_existing_only() {
        let store = store_with(&[1]);
        let mut account = store.find_by_id(&id(1)).unwrap();
        account.owner = "renamed".to_string();

        store.save(&account).unwrap();
        assert_eq!(store.find_by_id(&id(1)).unwrap().owner, "renamed");

        let missing = Account::new(id(9), Currency::Usd, "x");
        assert!(store.save(&missing).is_err());
    }

    #[test]
    fn test_lock_wait_times_out() {
        let store = InMemoryAccountStore::new(Duration::from_millis(20));
        store.insert(Account::new(id(1), Currency::Usd, "owner")).unwrap();

        let observed = store
            .update(&id(1), |_| {
                let waiter = thread::scope(|s| s.spawn(|| store.find_by_id(&id(1))).join());
                Ok(waiter.unwrap())
            })
            .unwrap();

        assert_eq!(observed, Err(LedgerError::lock_timeout(&id(1), 20)));
    }

    #[test]
    fn test_reported_wait_saturates() {
        assert_eq!(saturating_millis(Duration::from_millis(250)), 250);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_accounts_snapshot() {
        let store = store_with(&[1, 2, 3]);
        let mut ids: Vec<AccountId> = store.accounts().into_iter().map(|a| a.id).collect();
        ids.sort();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
        assert_eq!(store.len(), 3);
    }
}
