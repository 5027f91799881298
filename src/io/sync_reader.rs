//! Synchronous CSV readers
//!
//! Provides a streaming iterator over ledger commands and a loader for the
//! accounts file. Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()` /
//!   `read_accounts()`
//! - Individual command parsing errors are yielded as Err variants in the
//!   iterator, with line numbers
//! - Invalid account rows are logged and skipped

use crate::core::identifier::IbanCodec;
use crate::io::csv_format::{convert_account_record, convert_csv_record, AccountRecord, CsvRecord};
use crate::types::{Account, LedgerCommand};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;
use tracing::warn;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Synchronous command reader
///
/// Provides an iterator interface over ledger commands with constant memory
/// usage.
///
/// # Examples
///
/// ```no_run
/// use bank_ledger_engine::io::sync_reader::SyncReader;
/// use std::path::Path;
///
/// let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
/// let commands: Vec<_> = reader.filter_map(Result::ok).collect();
/// println!("Successfully parsed {} commands", commands.len());
/// ```
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// # Errors
    ///
    /// Returns an error message if the file could not be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<LedgerCommand, String>;

    /// Get the next command from the CSV file
    ///
    /// # Returns
    ///
    /// * `Some(Ok(LedgerCommand))` - Successfully parsed command
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let next = deserializer.next()?;
        self.line_num += 1;

        // +1 for the header row
        let line = self.line_num + 1;
        Some(match next {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

/// Load the accounts file
///
/// Rows that fail to parse or convert are logged at `warn` and skipped.
///
/// # Errors
///
/// Returns an error message if the file could not be opened.
pub fn read_accounts(path: &Path, codec: &IbanCodec) -> Result<Vec<Account>, String> {
    let mut reader = open_csv(path)?;
    let mut accounts = Vec::new();

    for (index, row) in reader.deserialize::<AccountRecord>().enumerate() {
        let line = index + 2;
        match row {
            Ok(record) => match convert_account_record(record, codec) {
                Ok(account) => accounts.push(account),
                Err(e) => warn!(line, "Skipping account row: {}", e),
            },
            Err(e) => warn!(line, "Skipping account row: CSV parse error: {}", e),
        }
    }

    Ok(accounts)
}
