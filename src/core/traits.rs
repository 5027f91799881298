//! Core traits for account storage, transaction processing and write notification
//!
//! This module defines the seams of the ledger core:
//! - `AccountStore` is the contract the engine and the state machine consume.
//!   Any backend that can provide exclusive read-modify-write access to one or
//!   two accounts can be plugged in.
//! - `TransactionProcessor` is the processing interface shared by the engine
//!   and the decorators that wrap it.
//! - `MutationListener` receives a notification after every committed write.

use crate::types::{Account, AccountId, LedgerError, TransactionReceipt, TransactionRequest};

/// Storage contract for accounts
///
/// Reads return snapshots. Writes that depend on the current state go through
/// `update` / `update_pair`, which hold exclusive access to the account(s) for
/// the whole duration of the closure and commit only if it returns `Ok`.
///
/// Implementations must be safe to share between threads.
pub trait AccountStore: Send + Sync {
    /// Read a snapshot of an account
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account has this identifier.
    fn find_by_id(&self, id: &AccountId) -> Result<Account, LedgerError>;

    /// Insert a new account
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the identifier is already taken.
    fn insert(&self, account: Account) -> Result<Account, LedgerError>;

    /// Overwrite an existing account record
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account has this identifier.
    fn save(&self, account: &Account) -> Result<Account, LedgerError>;

    /// Mutate one account under exclusive access
    ///
    /// `f` receives a working copy. The copy replaces the stored record only
    /// if `f` returns `Ok`; otherwise the record is left untouched.
    fn update<R, F>(&self, id: &AccountId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<R, LedgerError>;

    /// Mutate two distinct accounts under exclusive access
    ///
    /// Exclusive access is acquired in argument order; callers that need a
    /// deadlock-free ordering must sort the identifiers themselves. Both
    /// working copies commit together or neither does.
    fn update_pair<R, F>(&self, first: &AccountId, second: &AccountId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Account, &mut Account) -> Result<R, LedgerError>;

    /// Remove an account if `precondition` holds under exclusive access
    fn delete<F>(&self, id: &AccountId, precondition: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&Account) -> Result<(), LedgerError>;

    /// Snapshot of every stored account
    fn accounts(&self) -> Vec<Account>;
}

/// Trait for processing money-movement requests
pub trait TransactionProcessor: Send + Sync {
    /// Apply a request and return its receipt
    fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError>;
}

/// Receives the identifiers of accounts whose committed state just changed
pub trait MutationListener: Send + Sync {
    fn accounts_changed(&self, accounts: &[&AccountId]);
}
