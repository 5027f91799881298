//! Account-related types for the bank ledger engine
//!
//! This module defines the Account structure, its identifier, the closed set
//! of supported currencies and the account lifecycle status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account identifier
///
/// An IBAN-like code such as `BY59BANK0000000000000042`. Construction does not
/// validate the checksum; use [`crate::core::IbanCodec::parse`] for input that
/// comes from outside the ledger.
///
/// Identifiers are totally ordered; transfers rely on this order to acquire
/// exclusive access to both accounts deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a raw identifier string
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        AccountId(id)
    }
}

/// Supported account currencies
///
/// The set is closed: the ledger never converts between currencies, it only
/// checks that they match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// United States Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Belarusian Ruble
    Byn,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Byn => "BYN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "BYN" => Ok(Currency::Byn),
            _ => Err(format!("Unsupported currency '{}'", value)),
        }
    }
}

/// Account lifecycle status
///
/// There is no terminal state: a closed account can be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Accepts deposits, withdrawals and transfers
    Active,
    /// Rejects every balance mutation; may be reopened or deleted
    Closed,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => f.write_str("ACTIVE"),
            AccountStatus::Closed => f.write_str("CLOSED"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "CLOSED" => Ok(AccountStatus::Closed),
            _ => Err(format!("Unknown account status '{}'", value)),
        }
    }
}

/// Bank account state
///
/// Invariants maintained by the engine and the state machine:
/// - `balance` is never negative
/// - an account becomes `Closed` only with a zero balance
/// - a `Closed` account's balance never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, checksum-valid identifier
    pub id: AccountId,

    /// Current balance in `currency`
    pub balance: Decimal,

    /// Currency the account is held in
    pub currency: Currency,

    /// Lifecycle status
    pub status: AccountStatus,

    /// Owner reference, opaque to the ledger
    pub owner: String,
}

impl Account {
    /// Create a freshly provisioned account
    ///
    /// # Returns
    ///
    /// A new Account with:
    /// - balance = 0
    /// - status = ACTIVE
    pub fn new(id: AccountId, currency: Currency, owner: impl Into<String>) -> Self {
        Account {
            id,
            balance: Decimal::ZERO,
            currency,
            status: AccountStatus::Active,
            owner: owner.into(),
        }
    }

    /// Whether the account currently accepts balance mutations
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
