//! Error types for the bank ledger engine
//!
//! This module defines every error the ledger core can return. Each variant
//! carries the context a caller needs to act on it (account, requested amount,
//! available balance, operation).
//!
//! # Error Categories
//!
//! - **NotFound**: the referenced account does not exist
//! - **Validation**: malformed input (missing or non-positive amount, missing
//!   currency, same-account transfer, reused request id)
//! - **Business**: well-formed input rejected by a domain rule (insufficient
//!   funds, closed account, currency mismatch, lifecycle violations)
//! - **Infrastructure**: the store failed for reasons unrelated to the request
//!   (lock timeout, unavailable backend)

use super::account::{AccountId, Currency};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Category of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Business,
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => f.write_str("NotFound"),
            ErrorKind::Validation => f.write_str("Validation"),
            ErrorKind::Business => f.write_str("Business"),
            ErrorKind::Infrastructure => f.write_str("Infrastructure"),
        }
    }
}

/// Main error type for the ledger core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Referenced account does not exist
    #[error("Account {account} not found")]
    AccountNotFound {
        /// The identifier that was looked up
        account: AccountId,
    },

    /// Identifier failed structural or checksum validation
    #[error("Invalid account identifier '{identifier}'")]
    InvalidIdentifier {
        /// The rejected identifier
        identifier: String,
    },

    /// Amount field is missing
    #[error("Amount must be positive: no amount given for {operation}")]
    MissingAmount {
        /// Operation that requires an amount
        operation: String,
    },

    /// Amount is zero or negative
    #[error("Amount must be positive: {operation} requested {amount}")]
    NonPositiveAmount {
        /// Operation that was requested
        operation: String,
        /// The rejected amount
        amount: Decimal,
    },

    /// Currency field is missing
    #[error("Currency is required for {operation}")]
    MissingCurrency {
        /// Operation that requires a currency
        operation: String,
    },

    /// Sender and receiver are the same account
    #[error("Sender and receiver account cannot be the same: {account}")]
    SameAccountTransfer {
        /// The account named on both sides
        account: AccountId,
    },

    /// Request id was already used for a different request
    #[error("Request id '{key}' was already used for a different request")]
    IdempotencyConflict {
        /// The reused request id
        key: String,
    },

    /// Account is closed and rejects balance mutations
    #[error("Account {account} is closed")]
    AccountClosed {
        /// Closed account
        account: AccountId,
    },

    /// Account currency differs from the request currency
    #[error("Currency mismatch on account {account}: account holds {account_currency}, request is in {requested}")]
    CurrencyMismatch {
        /// Account whose currency differs
        account: AccountId,
        /// Currency the account is held in
        account_currency: Currency,
        /// Currency named by the request
        requested: Currency,
    },

    /// Debited account does not hold enough funds
    #[error("Insufficient funds on account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Debited account
        account: AccountId,
        /// Balance at the time of the check
        available: Decimal,
        /// Requested amount
        requested: Decimal,
    },

    /// Close requested on an account that is already closed
    #[error("Account {account} is already closed")]
    AlreadyClosed {
        /// Closed account
        account: AccountId,
    },

    /// Close requested on an account that still holds funds
    #[error("Account {account} cannot be closed with a positive balance of {balance}")]
    PositiveBalance {
        /// Account that was asked to close
        account: AccountId,
        /// Its remaining balance
        balance: Decimal,
    },

    /// Operation requires a closed account
    #[error("Account {account} is not in closed state ({operation})")]
    NotClosed {
        /// Account that is still active
        account: AccountId,
        /// Operation that was refused
        operation: String,
    },

    /// Provisioning collided with an existing identifier
    #[error("Account {account} already exists")]
    DuplicateAccount {
        /// Existing identifier
        account: AccountId,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account whose balance would overflow
        account: AccountId,
    },

    /// Exclusive access to an account was not granted in time
    #[error("Timed out after {waited_ms}ms waiting for exclusive access to account {account}")]
    LockTimeout {
        /// Account whose lock could not be taken
        account: AccountId,
        /// Configured wait in milliseconds
        waited_ms: u64,
    },

    /// The store failed for a reason unrelated to the request
    #[error("Account store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure
        message: String,
    },
}

impl LedgerError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound { .. } => ErrorKind::NotFound,
            LedgerError::InvalidIdentifier { .. }
            | LedgerError::MissingAmount { .. }
            | LedgerError::NonPositiveAmount { .. }
            | LedgerError::MissingCurrency { .. }
            | LedgerError::SameAccountTransfer { .. }
            | LedgerError::IdempotencyConflict { .. } => ErrorKind::Validation,
            LedgerError::AccountClosed { .. }
            | LedgerError::CurrencyMismatch { .. }
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::AlreadyClosed { .. }
            | LedgerError::PositiveBalance { .. }
            | LedgerError::NotClosed { .. }
            | LedgerError::DuplicateAccount { .. }
            | LedgerError::ArithmeticOverflow { .. } => ErrorKind::Business,
            LedgerError::LockTimeout { .. } | LedgerError::StoreUnavailable { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Whether the same request may succeed if simply resubmitted
    ///
    /// Only infrastructure failures qualify; the core itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an AccountNotFound error
    pub fn account_not_found(account: &AccountId) -> Self {
        LedgerError::AccountNotFound {
            account: account.clone(),
        }
    }

    /// Create an InvalidIdentifier error
    pub fn invalid_identifier(identifier: &str) -> Self {
        LedgerError::InvalidIdentifier {
            identifier: identifier.to_string(),
        }
    }

    /// Create a MissingAmount error
    pub fn missing_amount(operation: &str) -> Self {
        LedgerError::MissingAmount {
            operation: operation.to_string(),
        }
    }

    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(operation: &str, amount: Decimal) -> Self {
        LedgerError::NonPositiveAmount {
            operation: operation.to_string(),
            amount,
        }
    }

    /// Create a MissingCurrency error
    pub fn missing_currency(operation: &str) -> Self {
        LedgerError::MissingCurrency {
            operation: operation.to_string(),
        }
    }

    /// Create a SameAccountTransfer error
    pub fn same_account_transfer(account: &AccountId) -> Self {
        LedgerError::SameAccountTransfer {
            account: account.clone(),
        }
    }

    /// Create an IdempotencyConflict error
    pub fn idempotency_conflict(key: &str) -> Self {
        LedgerError::IdempotencyConflict {
            key: key.to_string(),
        }
    }

    /// Create an AccountClosed error
    pub fn account_closed(account: &AccountId) -> Self {
        LedgerError::AccountClosed {
            account: account.clone(),
        }
    }

    /// Create a CurrencyMismatch error
    pub fn currency_mismatch(
        account: &AccountId,
        account_currency: Currency,
        requested: Currency,
    ) -> Self {
        LedgerError::CurrencyMismatch {
            account: account.clone(),
            account_currency,
            requested,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: &AccountId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account: account.clone(),
            available,
            requested,
        }
    }

    /// Create an AlreadyClosed error
    pub fn already_closed(account: &AccountId) -> Self {
        LedgerError::AlreadyClosed {
            account: account.clone(),
        }
    }

    /// Create a PositiveBalance error
    pub fn positive_balance(account: &AccountId, balance: Decimal) -> Self {
        LedgerError::PositiveBalance {
            account: account.clone(),
            balance,
        }
    }

    /// Create a NotClosed error
    pub fn not_closed(account: &AccountId, operation: &str) -> Self {
        LedgerError::NotClosed {
            account: account.clone(),
            operation: operation.to_string(),
        }
    }

    /// Create a DuplicateAccount error
    pub fn duplicate_account(account: &AccountId) -> Self {
        LedgerError::DuplicateAccount {
            account: account.clone(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.clone(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account: &AccountId, waited_ms: u64) -> Self {
        LedgerError::LockTimeout {
            account: account.clone(),
            waited_ms,
        }
    }

    /// Create a StoreUnavailable error
    pub fn store_unavailable(message: &str) -> Self {
        LedgerError::StoreUnavailable {
            message: message.to_string(),
        }
    }
}
