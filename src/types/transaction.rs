//! Transaction-related types for the bank ledger engine
//!
//! This module defines the transaction request union, the kind discriminator
//! used in errors and logs, and the receipt returned on success.

use super::account::{AccountId, Currency};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account (requires sufficient balance)
    Withdrawal,

    /// Move funds between two accounts of the same currency
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => f.write_str("deposit"),
            TransactionKind::Withdrawal => f.write_str("withdrawal"),
            TransactionKind::Transfer => f.write_str("transfer"),
        }
    }
}

/// A money-movement request
///
/// The amount and currency are optional because the upstream layer may omit
/// them; the validator rejects a request where either is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRequest {
    /// Credit `amount` to `account`
    Deposit {
        account: AccountId,
        amount: Option<Decimal>,
        currency: Option<Currency>,
    },

    /// Debit `amount` from `account`
    Withdrawal {
        account: AccountId,
        amount: Option<Decimal>,
        currency: Option<Currency>,
    },

    /// Debit `from` and credit `to` by `amount`, atomically
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Option<Decimal>,
        currency: Option<Currency>,
    },
}

impl TransactionRequest {
    /// Build a fully specified deposit request
    pub fn deposit(account: AccountId, amount: Decimal, currency: Currency) -> Self {
        TransactionRequest::Deposit {
            account,
            amount: Some(amount),
            currency: Some(currency),
        }
    }

    /// Build a fully specified withdrawal request
    pub fn withdrawal(account: AccountId, amount: Decimal, currency: Currency) -> Self {
        TransactionRequest::Withdrawal {
            account,
            amount: Some(amount),
            currency: Some(currency),
        }
    }

    /// Build a fully specified transfer request
    pub fn transfer(from: AccountId, to: AccountId, amount: Decimal, currency: Currency) -> Self {
        TransactionRequest::Transfer {
            from,
            to,
            amount: Some(amount),
            currency: Some(currency),
        }
    }

    /// The discriminator of this request
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionRequest::Deposit { .. } => TransactionKind::Deposit,
            TransactionRequest::Withdrawal { .. } => TransactionKind::Withdrawal,
            TransactionRequest::Transfer { .. } => TransactionKind::Transfer,
        }
    }

    /// Every account the request touches, debited account first
    pub fn accounts(&self) -> Vec<&AccountId> {
        match self {
            TransactionRequest::Deposit { account, .. }
            | TransactionRequest::Withdrawal { account, .. } => vec![account],
            TransactionRequest::Transfer { from, to, .. } => vec![from, to],
        }
    }
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (amount, currency) = match self {
            TransactionRequest::Deposit {
                amount, currency, ..
            }
            | TransactionRequest::Withdrawal {
                amount, currency, ..
            }
            | TransactionRequest::Transfer {
                amount, currency, ..
            } => (amount, currency),
        };
        let amount = amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
        let currency = currency.map(|c| c.code()).unwrap_or("-");

        match self {
            TransactionRequest::Transfer { from, to, .. } => {
                write!(f, "transfer {} {} from {} to {}", amount, currency, from, to)
            }
            TransactionRequest::Deposit { account, .. }
            | TransactionRequest::Withdrawal { account, .. } => {
                write!(f, "{} {} {} on {}", self.kind(), amount, currency, account)
            }
        }
    }
}

/// Outcome carried by a receipt
///
/// Failures never produce receipts; they are returned as `LedgerError`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
}

/// Proof that a transaction was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Human readable description of the movement
    pub message: String,

    /// When the movement was committed
    pub timestamp: DateTime<Utc>,

    /// Always `Outcome::Success`
    pub outcome: Outcome,
}

impl TransactionReceipt {
    /// Create a success receipt stamped with the current time
    pub fn success(message: impl Into<String>) -> Self {
        TransactionReceipt {
            message: message.into(),
            timestamp: Utc::now(),
            outcome: Outcome::Success,
        }
    }
}
