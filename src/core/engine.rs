//! Transaction processing engine
//!
//! This module provides the TransactionEngine that applies deposits,
//! withdrawals and transfers to accounts held in an [`AccountStore`].
//!
//! # Design
//!
//! Every request goes through the same three steps:
//!
//! 1. `TransactionValidator::validate` checks the request against store
//!    snapshots and produces a `CheckedRequest`.
//! 2. An exhaustive `match` on the checked request selects the executor.
//! 3. The executor takes exclusive access to the touched account(s) through
//!    `AccountStore::update` / `update_pair`, re-runs the balance and state
//!    rules on the locked working copies, mutates them with checked
//!    arithmetic, and lets the store commit.
//!
//! After a commit the engine notifies its mutation listeners.
//!
//! # Thread Safety
//!
//! The engine holds no mutable state of its own and is shared by `Arc`.
//! Transfers acquire both accounts in ascending `AccountId` order whatever
//! their direction, so opposing transfers between the same pair of accounts
//! cannot deadlock.

use crate::core::traits::{AccountStore, MutationListener, TransactionProcessor};
use crate::core::validator::{self, CheckedRequest, TransactionValidator};
use crate::types::{
    AccountId, Currency, LedgerError, TransactionKind, TransactionReceipt, TransactionRequest,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Transaction processing engine
///
/// Orchestrates validation and balance mutation. Enforces the ledger
/// invariants: balances never go negative, currencies match, closed accounts
/// never move, and a transfer commits both sides or neither.
pub struct TransactionEngine<S> {
    store: Arc<S>,
    validator: TransactionValidator<S>,
    listeners: Vec<Arc<dyn MutationListener>>,
}

impl<S: AccountStore> TransactionEngine<S> {
    /// Create a new TransactionEngine over a shared store
    pub fn new(store: Arc<S>) -> Self {
        TransactionEngine {
            validator: TransactionValidator::new(Arc::clone(&store)),
            store,
            listeners: Vec::new(),
        }
    }

    /// Register a listener notified after every committed movement
    pub fn with_listener(mut self, listener: Arc<dyn MutationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// The store this engine mutates
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Process a single transaction request
    ///
    /// # Arguments
    ///
    /// * `request` - The deposit, withdrawal or transfer to apply
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionReceipt)` if the movement was committed
    /// * `Err(LedgerError)` if it was rejected or the commit failed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is missing or not positive, or the currency is missing
    /// - A referenced account does not exist
    /// - An account is closed or held in another currency
    /// - A transfer names the same account twice
    /// - The debited account has insufficient funds
    /// - Exclusive access could not be acquired or the store failed
    pub fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        match self.validator.validate(&request)? {
            CheckedRequest::Deposit {
                account,
                amount,
                currency,
            } => self.execute_deposit(&account, amount, currency),
            CheckedRequest::Withdrawal {
                account,
                amount,
                currency,
            } => self.execute_withdrawal(&account, amount, currency),
            CheckedRequest::Transfer {
                from,
                to,
                amount,
                currency,
            } => self.execute_transfer(&from, &to, amount, currency),
        }
    }

    /// Deposit `amount` in the account's own currency
    pub fn deposit(&self, id: &AccountId, amount: Decimal) -> Result<TransactionReceipt, LedgerError> {
        validator::check_amount(TransactionKind::Deposit, Some(amount))?;
        let currency = self.store.find_by_id(id)?.currency;
        self.process(TransactionRequest::deposit(id.clone(), amount, currency))
    }

    /// Withdraw `amount` in the account's own currency
    pub fn withdraw(&self, id: &AccountId, amount: Decimal) -> Result<TransactionReceipt, LedgerError> {
        validator::check_amount(TransactionKind::Withdrawal, Some(amount))?;
        let currency = self.store.find_by_id(id)?.currency;
        self.process(TransactionRequest::withdrawal(id.clone(), amount, currency))
    }

    /// Transfer `amount` in the sender's currency
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<TransactionReceipt, LedgerError> {
        validator::check_amount(TransactionKind::Transfer, Some(amount))?;
        let currency = self.store.find_by_id(from)?.currency;
        self.process(TransactionRequest::transfer(
            from.clone(),
            to.clone(),
            amount,
            currency,
        ))
    }

    fn execute_deposit(
        &self,
        id: &AccountId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.store.update(id, |account| {
            validator::check_deposit(account, currency)?;
            account.balance = account
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", &account.id))?;
            Ok(())
        })?;

        debug!(account = %id, %amount, %currency, "deposit committed");
        self.notify(&[id]);

        Ok(TransactionReceipt::success(format!(
            "Deposit success: +{} {}",
            amount, currency
        )))
    }

    fn execute_withdrawal(
        &self,
        id: &AccountId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.store.update(id, |account| {
            validator::check_withdrawal(account, amount, currency)?;
            account.balance = account
                .balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("withdrawal", &account.id))?;
            Ok(())
        })?;

        debug!(account = %id, %amount, %currency, "withdrawal committed");
        self.notify(&[id]);

        Ok(TransactionReceipt::success(format!(
            "Withdrawal success: -{} {}",
            amount, currency
        )))
    }

    fn execute_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<TransactionReceipt, LedgerError> {
        // Lock order is by identifier, not by direction
        let debit_first = from <= to;
        let (first, second) = if debit_first { (from, to) } else { (to, from) };

        self.store.update_pair(first, second, |a, b| {
            let (debit, credit) = if debit_first { (a, b) } else { (b, a) };
            validator::check_transfer(debit, credit, amount, currency)?;

            let debited = debit
                .balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", &debit.id))?;
            let credited = credit
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", &credit.id))?;

            debit.balance = debited;
            credit.balance = credited;
            Ok(())
        })?;

        debug!(%from, %to, %amount, %currency, "transfer committed");
        self.notify(&[from, to]);

        Ok(TransactionReceipt::success(format!(
            "Transfer {} {} from {} to {}",
            amount, currency, from, to
        )))
    }

    fn notify(&self, accounts: &[&AccountId]) {
        for listener in &self.listeners {
            listener.accounts_changed(accounts);
        }
    }
}

impl<S: AccountStore> TransactionProcessor for TransactionEngine<S> {
    fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        TransactionEngine::process(self, request)
    }
}
