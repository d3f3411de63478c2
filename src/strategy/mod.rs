//! Processing strategy module
//!
//! This module defines the Strategy pattern for complete processing pipelines,
//! encompassing both CSV parsing and operation execution. Different reading
//! implementations (synchronous, asynchronous batch) can be selected at
//! runtime; all of them apply operations to a single engine in input order,
//! so they produce identical results for the same input.

use crate::cli::StrategyType;
use crate::config::ProtocolConfig;
use crate::core::SettlementEngine;
use crate::io::csv_format::write_invoices_csv;
use crate::types::OperationRecord;
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete processing pipelines
///
/// Each strategy reads operation records from a CSV file and applies them,
/// in order, to a fresh `SettlementEngine`.
pub trait ProcessingStrategy: Send + Sync {
    /// Execute every operation in the input file
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the operation log CSV
    ///
    /// # Returns
    ///
    /// * `Ok(SettlementEngine)` holding the final protocol state
    /// * `Err(String)` if a fatal error occurred (file not found, invalid
    ///   protocol configuration, runtime failure)
    ///
    /// # Errors
    ///
    /// Rejected operations and malformed rows are logged and skipped; they
    /// never make this method fail.
    fn run(&self, input_path: &Path) -> Result<SettlementEngine, String>;

    /// Execute the input file and write the resulting invoice book to `output`
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let engine = self.run(input_path)?;
        write_invoices_csv(&engine.invoices(), engine.state().advances(), output)
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub committed: u64,
    pub rejected: u64,
    pub malformed: u64,
}

impl RunSummary {
    /// Apply one record to `engine`, logging a rejection instead of failing
    pub fn apply(&mut self, engine: &mut SettlementEngine, record: OperationRecord) {
        let operation = record.operation.name();
        let caller = record.caller.clone();
        let at = record.at;

        match engine.process(record) {
            Ok(()) => self.committed += 1,
            Err(e) => {
                self.rejected += 1;
                warn!(operation, caller = %caller, at, error = %e, "operation rejected");
            }
        }
    }
}

/// Build a fresh engine, turning a configuration error into a fatal one
pub(crate) fn new_engine(config: &ProtocolConfig) -> Result<SettlementEngine, String> {
    SettlementEngine::new(config.clone())
        .map_err(|e| format!("Invalid protocol configuration: {}", e))
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch_config` - Optional configuration for async batch reading (ignored for sync)
/// * `protocol_config` - Configuration of the engine each run starts from
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    protocol_config: ProtocolConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(protocol_config)),
        StrategyType::Async => {
            let batch_config = batch_config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch_config, protocol_config))
        }
    }
}
