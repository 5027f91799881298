//! Pre-transaction validation
//!
//! The rules run in a fixed order and the first failure wins:
//!
//! 1. amount present and strictly positive
//! 2. currency present
//! 3. every referenced account exists
//! 4. every referenced account is ACTIVE
//! 5. every referenced account is held in the request currency
//! 6. a transfer names two different accounts
//! 7. the debited account holds at least the amount
//!
//! [`TransactionValidator::validate`] runs all seven against store snapshots.
//! Snapshots can be stale by the time the engine acquires the accounts, so
//! rules 4 to 7 are also exposed as pure functions over `Account` values and
//! the engine re-runs them on the locked working copies.

use crate::core::traits::AccountStore;
use crate::types::{
    Account, AccountId, Currency, LedgerError, TransactionKind, TransactionRequest,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// A request whose amount and currency are known to be present and valid
#[derive(Debug, Clone, PartialEq)]
pub enum CheckedRequest {
    Deposit {
        account: AccountId,
        amount: Decimal,
        currency: Currency,
    },
    Withdrawal {
        account: AccountId,
        amount: Decimal,
        currency: Currency,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: Currency,
    },
}

/// Runs the ordered validation rules against the current store state
#[derive(Debug)]
pub struct TransactionValidator<S> {
    store: Arc<S>,
}

impl<S: AccountStore> TransactionValidator<S> {
    pub fn new(store: Arc<S>) -> Self {
        TransactionValidator { store }
    }

    /// Validate a request against store snapshots
    ///
    /// # Returns
    ///
    /// * `Ok(CheckedRequest)` with concrete amount and currency
    /// * `Err(LedgerError)` for the first rule that fails
    pub fn validate(&self, request: &TransactionRequest) -> Result<CheckedRequest, LedgerError> {
        let kind = request.kind();

        match request {
            TransactionRequest::Deposit {
                account,
                amount,
                currency,
            } => {
                let amount = check_amount(kind, *amount)?;
                let currency = check_currency(kind, *currency)?;
                let snapshot = self.store.find_by_id(account)?;
                check_deposit(&snapshot, currency)?;

                Ok(CheckedRequest::Deposit {
                    account: account.clone(),
                    amount,
                    currency,
                })
            }
            TransactionRequest::Withdrawal {
                account,
                amount,
                currency,
            } => {
                let amount = check_amount(kind, *amount)?;
                let currency = check_currency(kind, *currency)?;
                let snapshot = self.store.find_by_id(account)?;
                check_withdrawal(&snapshot, amount, currency)?;

                Ok(CheckedRequest::Withdrawal {
                    account: account.clone(),
                    amount,
                    currency,
                })
            }
            TransactionRequest::Transfer {
                from,
                to,
                amount,
                currency,
            } => {
                let amount = check_amount(kind, *amount)?;
                let currency = check_currency(kind, *currency)?;
                let debit = self.store.find_by_id(from)?;
                let credit = self.store.find_by_id(to)?;
                check_transfer(&debit, &credit, amount, currency)?;

                Ok(CheckedRequest::Transfer {
                    from: from.clone(),
                    to: to.clone(),
                    amount,
                    currency,
                })
            }
        }
    }
}

/// Rule 1
pub fn check_amount(kind: TransactionKind, amount: Option<Decimal>) -> Result<Decimal, LedgerError> {
    let operation = kind.to_string();
    let amount = amount.ok_or_else(|| LedgerError::missing_amount(&operation))?;

    if amount <= Decimal::ZERO {
        return Err(LedgerError::non_positive_amount(&operation, amount));
    }
    Ok(amount)
}

/// Rule 2
pub fn check_currency(
    kind: TransactionKind,
    currency: Option<Currency>,
) -> Result<Currency, LedgerError> {
    currency.ok_or_else(|| LedgerError::missing_currency(&kind.to_string()))
}

/// Rule 4
pub fn check_active(account: &Account) -> Result<(), LedgerError> {
    if account.is_active() {
        Ok(())
    } else {
        Err(LedgerError::account_closed(&account.id))
    }
}

/// Rule 5
pub fn check_currency_match(account: &Account, currency: Currency) -> Result<(), LedgerError> {
    if account.currency == currency {
        Ok(())
    } else {
        Err(LedgerError::currency_mismatch(
            &account.id,
            account.currency,
            currency,
        ))
    }
}

/// Rule 6
pub fn check_distinct(from: &AccountId, to: &AccountId) -> Result<(), LedgerError> {
    if from == to {
        Err(LedgerError::same_account_transfer(from))
    } else {
        Ok(())
    }
}

/// Rule 7
pub fn check_funds(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.balance >= amount {
        Ok(())
    } else {
        Err(LedgerError::insufficient_funds(
            &account.id,
            account.balance,
            amount,
        ))
    }
}

/// Rules 4-5 for the credited account of a deposit
pub fn check_deposit(account: &Account, currency: Currency) -> Result<(), LedgerError> {
    check_active(account)?;
    check_currency_match(account, currency)
}

/// Rules 4-7 for the debited account of a withdrawal
pub fn check_withdrawal(
    account: &Account,
    amount: Decimal,
    currency: Currency,
) -> Result<(), LedgerError> {
    check_active(account)?;
    check_currency_match(account, currency)?;
    check_funds(account, amount)
}

/// Rules 4-7 for both sides of a transfer
pub fn check_transfer(
    debit: &Account,
    credit: &Account,
    amount: Decimal,
    currency: Currency,
) -> Result<(), LedgerError> {
    check_active(debit)?;
    check_active(credit)?;
    check_currency_match(debit, currency)?;
    check_currency_match(credit, currency)?;
    check_distinct(&debit.id, &credit.id)?;
    check_funds(debit, amount)
}
