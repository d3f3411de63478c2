//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over operation records from a CSV file,
//! read in batches for the async processing pipeline.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures `AsyncRead` so any compat-wrapped tokio reader can feed it
//!
//! ```text
//! File → AsyncReader → Vec<OperationRecord> batches
//!             ↓
//!      csv_format module
//!      (CsvRecord, convert_csv_record)
//! ```
//!
//! Malformed rows are logged, counted and skipped; they never end a batch
//! early.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::OperationRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader yielding batches of operation records
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    skipped: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Wrap `reader`, trimming fields and accepting short rows
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            skipped: 0,
        }
    }

    /// Rows skipped so far because they could not be parsed or converted
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Read up to `batch_size` valid records
    ///
    /// Returns fewer records only at end of input; an empty batch means the
    /// input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<OperationRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let Some(result) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match result {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(record) => batch.push(record),
                    Err(e) => {
                        self.skipped += 1;
                        warn!(line, error = %e, "skipping malformed operation");
                    }
                },
                Err(e) => {
                    self.skipped += 1;
                    warn!(line, error = %e, "skipping unparseable row");
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Operation};
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "type,time,caller,invoice,target,role,amount,due,meta\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut async_reader = reader(
            "fund,0,admin,,lp,,100,,\n\
             deposit,1,lp,,,,50,,\n\
             withdraw,2,lp,,,,10,,\n",
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].caller, Address::from("admin"));
        assert_eq!(
            batch[1].operation,
            Operation::Deposit {
                amount: Decimal::new(50, 0)
            }
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].at, 2);

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");
        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_records() {
        let mut async_reader = reader(
            "launder,1,lp,,,,100,,\n\
             deposit,x,lp,,,,100,,\n\
             deposit,3,lp,,,,50,,\n",
        );

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].at, 3);
        assert_eq!(async_reader.skipped(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_and_case() {
        let mut async_reader = reader("  PAY , 9 , buyer , 4 , , , 1000 , , \n");

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].operation,
            Operation::PayInvoice {
                invoice_id: 4,
                amount: Decimal::new(1000, 0)
            }
        );
    }
}
