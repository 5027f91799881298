//! Ledger facade
//!
//! `LedgerService` wires the components of the core together around one
//! shared store:
//!
//! ```text
//! LedgerService
//!     ├── Arc<S: AccountStore>
//!     ├── IbanCodec                                   (identifier generation)
//!     ├── IdempotentProcessor
//!     │     └── TracedProcessor
//!     │           └── TransactionEngine ──notifies──┐
//!     ├── AccountStateMachine ──────────notifies────┤
//!     └── Arc<AccountCache> ◀───────────────────────┘
//! ```
//!
//! It is the entry point used by the driver; everything it does is delegated.

use crate::config::{ConfigError, LedgerConfig};
use crate::core::cache::AccountCache;
use crate::core::decorators::TracedProcessor;
use crate::core::engine::TransactionEngine;
use crate::core::identifier::IbanCodec;
use crate::core::idempotency::IdempotentProcessor;
use crate::core::lifecycle::AccountStateMachine;
use crate::core::traits::{AccountStore, TransactionProcessor};
use crate::types::{
    Account, AccountId, Currency, LedgerCommand, LedgerError, TransactionReceipt,
    TransactionRequest,
};
use std::sync::Arc;

/// Attempts at drawing an unused identifier before giving up
const MAX_GENERATION_ATTEMPTS: usize = 5;

type Processor<S> = IdempotentProcessor<TracedProcessor<TransactionEngine<S>>>;

/// Facade over the ledger core
pub struct LedgerService<S> {
    store: Arc<S>,
    codec: IbanCodec,
    processor: Processor<S>,
    lifecycle: AccountStateMachine<S>,
    cache: Arc<AccountCache>,
}

impl<S: AccountStore> LedgerService<S> {
    /// Build the service over `store`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured identifier codes are malformed.
    pub fn new(store: Arc<S>, config: &LedgerConfig) -> Result<Self, ConfigError> {
        let codec = config.codec()?;
        let cache = Arc::new(AccountCache::new(config.cache_capacity, config.cache_ttl));

        let engine = TransactionEngine::new(Arc::clone(&store)).with_listener(cache.clone());
        let lifecycle = AccountStateMachine::new(Arc::clone(&store)).with_listener(cache.clone());

        Ok(LedgerService {
            store,
            codec,
            processor: IdempotentProcessor::new(TracedProcessor::new(engine)),
            lifecycle,
            cache,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn codec(&self) -> &IbanCodec {
        &self.codec
    }

    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    /// The engine at the bottom of the processor stack
    pub fn engine(&self) -> &TransactionEngine<S> {
        self.processor.inner().inner()
    }

    /// Provision an account under a freshly generated identifier
    pub fn open_account(&self, owner: &str, currency: Currency) -> Result<Account, LedgerError> {
        let mut last_error = None;
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            match self.lifecycle.provision(self.codec.generate()?, currency, owner) {
                Err(e @ LedgerError::DuplicateAccount { .. }) => last_error = Some(e),
                other => return other,
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LedgerError::store_unavailable("could not generate an unused account identifier")
        }))
    }

    /// Seed an account with a known identifier and state
    ///
    /// The account is inserted as given; the identifier is not regenerated.
    pub fn restore_account(&self, account: Account) -> Result<Account, LedgerError> {
        self.store.insert(account)
    }

    /// Apply a money movement
    pub fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        self.processor.process(request)
    }

    /// Apply a money movement at most once per `key`
    pub fn process_once(
        &self,
        key: &str,
        request: TransactionRequest,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.processor.process_once(key, request)
    }

    pub fn close(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.lifecycle.close(id)
    }

    pub fn reopen(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.lifecycle.open(id)
    }

    pub fn delete(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.lifecycle.delete(id)
    }

    /// Read an account, served from the cache when possible
    pub fn account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        if let Some(account) = self.cache.get(id) {
            return Ok(account);
        }

        let generation = self.cache.generation();
        let account = self.store.find_by_id(id)?;
        self.cache.put_if_fresh(account.clone(), generation);
        Ok(account)
    }

    /// Snapshot of every account, sorted by identifier
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts = self.store.accounts();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }

    /// Execute one ledger command
    ///
    /// # Returns
    ///
    /// A human readable confirmation: the receipt message for money
    /// movements, or the lifecycle confirmation.
    pub fn execute(&self, command: &LedgerCommand) -> Result<String, LedgerError> {
        match command {
            LedgerCommand::Transaction {
                request,
                request_id: Some(key),
            } => Ok(self.process_once(key, request.clone())?.message),
            LedgerCommand::Transaction {
                request,
                request_id: None,
            } => Ok(self.process(request.clone())?.message),
            LedgerCommand::Close(id) => {
                self.close(id)?;
                Ok("Account is closed".to_string())
            }
            LedgerCommand::Reopen(id) => {
                self.reopen(id)?;
                Ok("Account is opened".to_string())
            }
            LedgerCommand::Delete(id) => {
                self.delete(id)?;
                Ok(format!("Account {} is deleted", id))
            }
        }
    }
}
