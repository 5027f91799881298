//! Account lifecycle state machine
//!
//! ```text
//!              close (balance == 0)
//!   ACTIVE ─────────────────────────▶ CLOSED ──── delete ───▶ (removed)
//!      ▲                                │
//!      └──────────── open ──────────────┘
//! ```
//!
//! Transitions run inside `AccountStore::update`, so the precondition is
//! evaluated on the same locked copy that is committed. Deletion runs the
//! CLOSED check under the store's exclusive access as well.

use crate::core::traits::{AccountStore, MutationListener};
use crate::types::{Account, AccountId, AccountStatus, Currency, LedgerError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// ACTIVE → CLOSED
///
/// # Errors
///
/// - `AlreadyClosed` if the account is not ACTIVE
/// - `PositiveBalance` if the account still holds funds
pub fn apply_close(account: &mut Account) -> Result<(), LedgerError> {
    if account.status == AccountStatus::Closed {
        return Err(LedgerError::already_closed(&account.id));
    }
    if account.balance > Decimal::ZERO {
        return Err(LedgerError::positive_balance(&account.id, account.balance));
    }

    account.status = AccountStatus::Closed;
    Ok(())
}

/// CLOSED → ACTIVE
///
/// # Errors
///
/// - `NotClosed` if the account is not CLOSED
pub fn apply_open(account: &mut Account) -> Result<(), LedgerError> {
    if account.status != AccountStatus::Closed {
        return Err(LedgerError::not_closed(&account.id, "open"));
    }

    account.status = AccountStatus::Active;
    Ok(())
}

fn require_closed(account: &Account) -> Result<(), LedgerError> {
    if account.status == AccountStatus::Closed {
        Ok(())
    } else {
        Err(LedgerError::not_closed(&account.id, "delete"))
    }
}

/// Applies lifecycle transitions through an [`AccountStore`]
pub struct AccountStateMachine<S> {
    store: Arc<S>,
    listeners: Vec<Arc<dyn MutationListener>>,
}

impl<S: AccountStore> AccountStateMachine<S> {
    pub fn new(store: Arc<S>) -> Self {
        AccountStateMachine {
            store,
            listeners: Vec::new(),
        }
    }

    /// Register a listener notified after every committed transition
    pub fn with_listener(mut self, listener: Arc<dyn MutationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Create a new ACTIVE account with a zero balance
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the identifier is taken.
    pub fn provision(
        &self,
        id: AccountId,
        currency: Currency,
        owner: &str,
    ) -> Result<Account, LedgerError> {
        let account = self.store.insert(Account::new(id, currency, owner))?;
        info!(account = %account.id, %currency, "account provisioned");
        Ok(account)
    }

    /// Close an ACTIVE account with a zero balance
    pub fn close(&self, id: &AccountId) -> Result<Account, LedgerError> {
        let account = self.store.update(id, |account| {
            apply_close(account)?;
            Ok(account.clone())
        })?;

        info!(account = %id, "account closed");
        self.notify(id);
        Ok(account)
    }

    /// Reopen a CLOSED account
    pub fn open(&self, id: &AccountId) -> Result<Account, LedgerError> {
        let account = self.store.update(id, |account| {
            apply_open(account)?;
            Ok(account.clone())
        })?;

        info!(account = %id, "account reopened");
        self.notify(id);
        Ok(account)
    }

    /// Remove a CLOSED account
    pub fn delete(&self, id: &AccountId) -> Result<Account, LedgerError> {
        let removed = self.store.delete(id, require_closed)?;

        info!(account = %id, "account deleted");
        self.notify(id);
        Ok(removed)
    }

    fn notify(&self, id: &AccountId) {
        for listener in &self.listeners {
            listener.accounts_changed(&[id]);
        }
    }
}
