//! Processing strategy module for ledger command replay
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seeding the ledger from an accounts file, parsing the command CSV, executing
//! every command through the ledger core and writing the final account states.
//! Different implementations (synchronous, asynchronous batch) can be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::core::{InMemoryAccountStore, LedgerService};
use crate::io::sync_reader::read_accounts;
use crate::types::{LedgerCommand, LedgerError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the commands in `input_path` and write the final account states
    ///
    /// # Arguments
    ///
    /// * `accounts_path` - Optional CSV of accounts to seed the ledger with
    /// * `input_path` - Path to the CSV file containing ledger commands
    /// * `output` - Mutable reference to a writer for outputting account states
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all processing completed (individual commands may have failed)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The ledger cannot be built from the configuration
    /// - Output cannot be written
    ///
    /// Individual command failures are logged and do not abort the replay.
    fn process(
        &self,
        accounts_path: Option<&Path>,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String>;
}

/// Build an in-memory ledger and seed it from the accounts file
pub(crate) fn build_ledger(
    config: &LedgerConfig,
    accounts_path: Option<&Path>,
) -> Result<LedgerService<InMemoryAccountStore>, String> {
    let store = Arc::new(InMemoryAccountStore::new(config.lock_timeout));
    let ledger = LedgerService::new(store, config).map_err(|e| e.to_string())?;

    if let Some(path) = accounts_path {
        for account in read_accounts(path, ledger.codec())? {
            let id = account.id.clone();
            if let Err(e) = ledger.restore_account(account) {
                warn!(account = %id, "Skipping account row: {}", e);
            }
        }
    }

    Ok(ledger)
}

/// Log the outcome of one executed command
pub(crate) fn report(command: &LedgerCommand, result: &Result<String, LedgerError>) {
    match result {
        Ok(message) => debug!(?command, "{}", message),
        Err(e) => warn!(?command, kind = %e.kind(), "Command processing error: {}", e),
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch_config` - Optional configuration for async batch processing (ignored for sync)
/// * `ledger_config` - Configuration of the ledger core
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    ledger_config: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger_config)),
        StrategyType::Async => {
            let batch_config = batch_config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch_config, ledger_config))
        }
    }
}
