//! Bank Ledger Engine Library
//! # Overview
//!
//! This library maintains bank account balances and applies deposits,
//! withdrawals and transfers under strict invariants, with a CSV replay driver
//! offering a sequential and a wave-parallel async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, TransactionRequest, LedgerError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::identifier`] - IBAN-like identifier generation and MOD 97-10 validation
//!   - [`core::validator`] - Ordered pre-transaction checks
//!   - [`core::engine`] - Atomic balance mutation
//!   - [`core::lifecycle`] - ACTIVE/CLOSED state machine
//!   - [`core::store`] - Per-account locking in-memory store
//!   - [`core::ledger`] - Facade wiring everything together
//! - [`io`] - CSV parsing and output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`config`] / [`logging`] - Ambient configuration and tracing setup
//!
//! # Invariants
//!
//! - A balance is never negative
//! - An account is closed only with a zero balance, and a closed account's
//!   balance never changes
//! - A transfer debits and credits together or not at all
//! - Movements never convert between currencies
//!
//! # Account States
//!
//! - **ACTIVE**: accepts deposits, withdrawals and transfers
//! - **CLOSED**: rejects every movement; may be reopened or deleted

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::{ConfigError, LedgerConfig};
pub use core::{
    AccountStateMachine, AccountStore, IbanCodec, InMemoryAccountStore, LedgerService,
    TransactionEngine, TransactionProcessor,
};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, AccountStatus, Currency, ErrorKind, LedgerCommand, LedgerError,
    TransactionReceipt, TransactionRequest,
};
