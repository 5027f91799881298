//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over ledger commands from a CSV file,
//! read in batches for the async strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LedgerCommands
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::LedgerCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous command reader
///
/// Wraps a csv-async deserializer. Records that fail to parse or convert are
/// logged and left out of the batch.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
        }
    }

    /// Read up to `batch_size` commands
    ///
    /// Returns an empty batch once the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let Some(next) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match next {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(command) => batch.push(command),
                    Err(e) => warn!(line, "Record conversion error: {}", e),
                },
                Err(e) => warn!(line, "CSV parse error: {}", e),
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, TransactionRequest};
    use futures::io::Cursor;

    const A: &str = "BY95BANK0000000000000001";

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = format!(
            "type,account,to,amount,currency,request_id\n\
             deposit,{A},,100.0,USD,\n\
             withdrawal,{A},,50.0,USD,\n\
             close,{A},,,,\n"
        );
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.into_bytes()));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert!(matches!(
            &batch[1],
            LedgerCommand::Transaction {
                request: TransactionRequest::Withdrawal { .. },
                ..
            }
        ));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch, vec![LedgerCommand::Close(AccountId::new(A))]);

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let csv_content = "type,account,to,amount,currency,request_id\n";
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_record() {
        let csv_content = format!(
            "type,account,to,amount,currency,request_id\n\
             refund,{A},,100.0,USD,\n\
             deposit,{A},,50.0,USD,\n"
        );
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.into_bytes()));

        // The invalid type is logged and dropped
        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
    }
}
