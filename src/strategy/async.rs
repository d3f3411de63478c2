//! Asynchronous batch processing strategy
//!
//! Overlaps reading of the operation log with execution. A tokio task reads
//! batches with `AsyncReader` and sends them through a bounded channel; the
//! engine drains the channel and applies every record in order.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_buffered_batches)
//!     ├── reader task: tokio::fs::File → AsyncReader → Vec<OperationRecord>
//!     ├── mpsc channel (capacity max_buffered_batches)
//!     └── SettlementEngine (single owner, sequential application)
//! ```
//!
//! The engine is never shared between tasks. Back-pressure from the bounded
//! channel caps memory at `batch_size * max_buffered_batches` pending rows.

use crate::config::ProtocolConfig;
use crate::core::SettlementEngine;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{new_engine, ProcessingStrategy, RunSummary};
use crate::types::{OperationRecord, ProtocolError};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info, warn};

/// Configuration for asynchronous batch reading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of records per batch
    pub batch_size: usize,

    /// Batches read ahead of the engine before the reader waits
    pub max_buffered_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_buffered_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_buffered_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size 0, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_buffered_batches = if max_buffered_batches == 0 {
            warn!(
                default = default.max_buffered_batches,
                "invalid max_buffered_batches 0, using default"
            );
            default.max_buffered_batches
        } else {
            max_buffered_batches
        };

        Self {
            batch_size,
            max_buffered_batches,
        }
    }
}

/// Asynchronous processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    batch: BatchConfig,
    config: ProtocolConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(batch: BatchConfig, config: ProtocolConfig) -> Self {
        Self { batch, config }
    }

    async fn run_pipeline(
        &self,
        input_path: &Path,
    ) -> Result<(SettlementEngine, RunSummary), String> {
        let file = tokio::fs::File::open(input_path)
            .await
            .map_err(|e| ProtocolError::open_failed(input_path, e).to_string())?;
        let mut engine = new_engine(&self.config)?;

        let (sender, mut receiver) =
            mpsc::channel::<Vec<OperationRecord>>(self.batch.max_buffered_batches);
        let batch_size = self.batch.batch_size;

        let reader_task = tokio::spawn(async move {
            let mut reader = AsyncReader::new(file.compat());
            let mut batches = 0usize;
            loop {
                let batch = reader.read_batch(batch_size).await;
                if batch.is_empty() {
                    break;
                }
                batches += 1;
                if sender.send(batch).await.is_err() {
                    break;
                }
            }
            (batches, reader.skipped())
        });

        let mut summary = RunSummary::default();
        while let Some(batch) = receiver.recv().await {
            debug!(records = batch.len(), "applying batch");
            for record in batch {
                summary.apply(&mut engine, record);
            }
        }

        let (batches, malformed) = reader_task
            .await
            .map_err(|e| format!("Reader task failed: {}", e))?;
        summary.malformed = malformed;

        info!(
            strategy = "async",
            batches,
            committed = summary.committed,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "run complete"
        );

        Ok((engine, summary))
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<SettlementEngine, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime
            .block_on(self.run_pipeline(input_path))
            .map(|(engine, _)| engine)
    }
}
