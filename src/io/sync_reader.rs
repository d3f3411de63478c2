//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operation records from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize CSV records
//! sequentially, delegating parsing and conversion to the csv_format module.
//! Rows are processed one at a time without loading the file into memory.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<OperationRecord, String>` for each CSV row:
//!
//! ```no_run
//! use invoice_settlement_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Operation: {:?}", record),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{OperationRecord, ProtocolError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader yielding operation records
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open `path` for reading
    ///
    /// The reader trims whitespace around every field and accepts rows with
    /// fewer columns than the header.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the file does not exist, `IoError` if it
    /// cannot be opened for another reason.
    pub fn new(path: &Path) -> Result<Self, ProtocolError> {
        let file = File::open(path).map_err(|e| ProtocolError::open_failed(path, e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRecord, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let result = deserializer.next()?;
        self.line_num += 1;

        // Line 1 is the header
        let line = self.line_num + 1;
        Some(match result {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: {}", line, ProtocolError::from(e))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Operation};
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "type,time,caller,invoice,target,role,amount,due,meta\n";

    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .and_then(|_| file.write_all(rows.as_bytes()))
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(
            result.unwrap_err(),
            ProtocolError::FileNotFound { .. }
        ));
    }

    #[test]
    fn test_sync_reader_iterates_operations() {
        let file = create_temp_csv(
            "fund,0,admin,,lp,,5000,,\n\
             deposit,1,lp,,,,5000,,\n\
             create,2,alice,,buyer,,1000,100,0xabc\n",
        );

        let records: Vec<OperationRecord> = SyncReader::new(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].operation,
            Operation::Fund {
                account: Address::from("lp"),
                amount: Decimal::new(5000, 0),
            }
        );
        assert_eq!(records[1].caller, Address::from("lp"));
        assert_eq!(records[2].at, 2);
        assert!(matches!(
            records[2].operation,
            Operation::CreateInvoice { due_date: 100, .. }
        ));
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_short_rows() {
        let file = create_temp_csv("  Deposit , 7 ,  lp , , , , 12.5\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.at, 7);
        assert_eq!(
            record.operation,
            Operation::Deposit {
                amount: Decimal::new(125, 1)
            }
        );
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "deposit,1,lp,,,,10,,\n\
             bogus,2,lp,,,,10,,\n\
             deposit,not_a_time,lp,,,,10,,\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[1].as_ref().unwrap_err().starts_with("Line 3:"));
        let parse_error = records[2].as_ref().unwrap_err();
        assert!(parse_error.starts_with("Line 4: CSV parse error"));
        assert!(parse_error.contains("invalid digit"));
    }

    #[test]
    fn test_sync_reader_continues_after_error() {
        let file = create_temp_csv(
            "advance,1,alice,,,,800,,\n\
             advance,2,alice,1,,,800,,\n",
        );

        let valid: Vec<OperationRecord> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].at, 2);
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
