//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It reads commands in batches and executes each
//! batch wave by wave.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (wave scheduling + blocking pool)
//!     └── LedgerService (shared core)
//!         └── InMemoryAccountStore (per-account locking)
//! ```
//!
//! # Parallelism
//!
//! - Batches are processed sequentially, so per-account order holds across
//!   the whole file
//! - Within a batch, commands touching disjoint accounts run in parallel
//! - The final state equals the synchronous strategy's

use crate::config::LedgerConfig;
use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::{build_ledger, report, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                "Invalid max_concurrent ({}), using default ({})",
                max_concurrent, default.max_concurrent
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AsyncProcessingStrategy {
    batch_config: BatchConfig,
    ledger_config: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(batch_config: BatchConfig, ledger_config: LedgerConfig) -> Self {
        Self {
            batch_config,
            ledger_config,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        accounts_path: Option<&Path>,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch_config.max_concurrent)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let ledger = Arc::new(build_ledger(&self.ledger_config, accounts_path)?);
            let processor = BatchProcessor::new(Arc::clone(&ledger), self.batch_config.max_concurrent);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.batch_config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Finish this batch before reading the next one
                for processed in processor.process_batch(batch).await {
                    report(&processed.command, &processed.result);
                }
            }

            write_accounts_csv(&ledger.accounts(), output)?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SyncProcessingStrategy;
    use tempfile::NamedTempFile;

    const A: &str = "BY95BANK0000000000000001";
    const B: &str = "BY68BANK0000000000000002";
    const C: &str = "BY41BANK0000000000000003";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_batch_config_replaces_zero_values() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config, BatchConfig::default());

        let config = BatchConfig::new(5, 2);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.max_concurrent, 2);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy = AsyncProcessingStrategy::default();
        let mut output = Vec::new();

        let result = strategy.process(None, Path::new("nonexistent.csv"), &mut output);
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_async_strategy_matches_sync_across_batches() {
        let accounts = create_temp_csv(&format!(
            "account,currency,balance,status,owner\n\
             {A},USD,100,ACTIVE,alice\n\
             {B},USD,50,ACTIVE,bob\n\
             {C},USD,0,ACTIVE,carol\n"
        ));
        let input = create_temp_csv(&format!(
            "type,account,to,amount,currency,request_id\n\
             withdrawal,{A},,30,USD,\n\
             transfer,{B},{C},50,USD,\n\
             transfer,{A},{B},70,USD,\n\
             close,{C},,,,\n\
             withdrawal,{C},,50,USD,\n\
             close,{C},,,,\n\
             deposit,{A},,10,USD,k-1\n\
             deposit,{A},,10,USD,k-1\n"
        ));

        // Small batches force commands on the same account into different batches
        let async_strategy =
            AsyncProcessingStrategy::new(BatchConfig::new(2, 2), LedgerConfig::default());
        let mut async_output = Vec::new();
        async_strategy
            .process(Some(accounts.path()), input.path(), &mut async_output)
            .unwrap();

        let mut sync_output = Vec::new();
        SyncProcessingStrategy::default()
            .process(Some(accounts.path()), input.path(), &mut sync_output)
            .unwrap();

        let async_output = String::from_utf8(async_output).unwrap();
        assert_eq!(async_output, String::from_utf8(sync_output).unwrap());
        assert!(async_output.contains(&format!("{A},USD,10.00,ACTIVE,alice")));
        assert!(async_output.contains(&format!("{B},USD,70.00,ACTIVE,bob")));
        assert!(async_output.contains(&format!("{C},USD,0.00,CLOSED,carol")));
    }
}
