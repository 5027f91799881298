//! Core business logic module
//!
//! This module contains the ledger core:
//! - `traits` - Store, processor and listener abstractions
//! - `identifier` - Account identifier generation and validation
//! - `store` - Thread-safe in-memory account store
//! - `validator` - Ordered pre-transaction checks
//! - `engine` - Deposit, withdrawal and transfer execution
//! - `lifecycle` - ACTIVE/CLOSED transitions, provisioning and deletion
//! - `cache` - LRU + TTL read cache invalidated on writes
//! - `decorators` - Tracing wrapper around a processor
//! - `idempotency` - At-most-once application of keyed requests
//! - `ledger` - Facade wiring the components together
//! - `batch_processor` - Wave-scheduled concurrent execution

pub mod batch_processor;
pub mod cache;
pub mod decorators;
pub mod engine;
pub mod identifier;
pub mod idempotency;
pub mod ledger;
pub mod lifecycle;
pub mod store;
pub mod traits;
pub mod validator;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use cache::AccountCache;
pub use decorators::TracedProcessor;
pub use engine::TransactionEngine;
pub use identifier::IbanCodec;
pub use idempotency::IdempotentProcessor;
pub use ledger::LedgerService;
pub use lifecycle::AccountStateMachine;
pub use store::InMemoryAccountStore;
pub use traits::{AccountStore, MutationListener, TransactionProcessor};
pub use validator::{CheckedRequest, TransactionValidator};
