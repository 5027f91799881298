//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command execution to `LedgerService` (business logic)
//! - CSV output to `csv_format::write_accounts_csv` (format handling)
//!
//! Commands are streamed one at a time and executed in file order, so this
//! strategy is the reference behaviour the async strategy must reproduce.

use crate::config::LedgerConfig;
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{build_ledger, report, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        accounts_path: Option<&Path>,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String> {
        let ledger = build_ledger(&self.config, accounts_path)?;
        let reader = SyncReader::new(input_path)?;

        for result in reader {
            match result {
                Ok(command) => {
                    let outcome = ledger.execute(&command);
                    report(&command, &outcome);
                }
                Err(e) => warn!("CSV parsing error: {}", e),
            }
        }

        write_accounts_csv(&ledger.accounts(), output)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const A: &str = "BY95BANK0000000000000001";
    const B: &str = "BY68BANK0000000000000002";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn accounts_file() -> NamedTempFile {
        create_temp_csv(&format!(
            "account,currency,balance,status,owner\n\
             {A},USD,1000,ACTIVE,alice\n\
             {B},USD,0,ACTIVE,bob\n"
        ))
    }

    fn run(commands: &str) -> String {
        let accounts = accounts_file();
        let input = create_temp_csv(commands);
        let strategy = SyncProcessingStrategy::default();

        let mut output = Vec::new();
        strategy
            .process(Some(accounts.path()), input.path(), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sync_strategy_applies_transfer() {
        let output = run(&format!(
            "type,account,to,amount,currency,request_id\ntransfer,{A},{B},400,USD,\n"
        ));

        assert_eq!(
            output,
            format!(
                "account,currency,balance,status,owner\n\
                 {B},USD,400.00,ACTIVE,bob\n\
                 {A},USD,600.00,ACTIVE,alice\n"
            )
        );
    }

    #[test]
    fn test_sync_strategy_continues_after_rejections() {
        let output = run(&format!(
            "type,account,to,amount,currency,request_id\n\
             withdrawal,{A},,5000,USD,\n\
             deposit,{B},,invalid,USD,\n\
             close,{A},,,,\n\
             withdrawal,{A},,100,USD,\n"
        ));

        assert!(output.contains(&format!("{A},USD,900.00,ACTIVE,alice")));
        assert!(output.contains(&format!("{B},USD,0.00,ACTIVE,bob")));
    }

    #[test]
    fn test_sync_strategy_without_accounts_file() {
        let input = create_temp_csv("type,account,to,amount,currency,request_id\n");
        let mut output = Vec::new();

        SyncProcessingStrategy::default()
            .process(None, input.path(), &mut output)
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,currency,balance,status,owner\n"
        );
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let mut output = Vec::new();
        let result =
            SyncProcessingStrategy::default().process(None, Path::new("nonexistent.csv"), &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
