//! Synchronous processing strategy
//!
//! Single-threaded implementation of the ProcessingStrategy trait. It
//! streams rows through `SyncReader` and applies each one to the engine as
//! soon as it is read, so memory stays proportional to the protocol state
//! rather than to the input size.

use crate::config::ProtocolConfig;
use crate::core::SettlementEngine;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{new_engine, ProcessingStrategy, RunSummary};
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use invoice_settlement_engine::config::ProtocolConfig;
/// use invoice_settlement_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(ProtocolConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("operations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: ProtocolConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<SettlementEngine, String> {
        let reader = SyncReader::new(input_path).map_err(|e| e.to_string())?;
        let mut engine = new_engine(&self.config)?;
        let mut summary = RunSummary::default();

        for result in reader {
            match result {
                Ok(record) => summary.apply(&mut engine, record),
                Err(e) => {
                    summary.malformed += 1;
                    warn!(error = %e, "skipping malformed row");
                }
            }
        }

        info!(
            strategy = "sync",
            committed = summary.committed,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "run complete"
        );

        Ok(engine)
    }
}
