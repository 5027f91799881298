//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account, identifier, currency and status types
//! - `transaction`: Transaction requests and receipts
//! - `command`: Ledger commands replayed by the driver
//! - `error`: Error types for the ledger core

pub mod account;
pub mod command;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, AccountStatus, Currency};
pub use command::LedgerCommand;
pub use error::{ErrorKind, LedgerError};
pub use transaction::{Outcome, TransactionKind, TransactionReceipt, TransactionRequest};
