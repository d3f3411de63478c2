use crate::config::ProtocolConfig;
use crate::strategy::BatchConfig;
use crate::types::Address;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the invoice settlement engine
#[derive(Parser, Debug)]
#[command(name = "invoice-settlement-engine")]
#[command(
    about = "Replay an invoice-financing operation log and report the invoice book",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the input CSV file
    #[arg(value_name = "INPUT", help = "Path to the operation log CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Reading strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch for the async strategy (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-buffered",
        value_name = "COUNT",
        help = "Batches read ahead of the engine (default: CPU cores)"
    )]
    pub max_buffered_batches: Option<usize>,

    #[arg(
        long = "events",
        value_name = "PATH",
        help = "Also write the event log CSV to this path"
    )]
    pub events_file: Option<PathBuf>,

    #[arg(long = "admin", value_name = "PRINCIPAL", default_value = "admin")]
    pub admin: String,

    #[arg(long = "treasury", value_name = "ACCOUNT", default_value = "treasury")]
    pub treasury: String,

    #[arg(
        long = "fee-bps",
        value_name = "BPS",
        default_value_t = 50,
        help = "Protocol fee charged at settlement, in basis points"
    )]
    pub fee_bps: u32,

    #[arg(
        long = "max-advance-bps",
        value_name = "BPS",
        default_value_t = 8_000,
        help = "Largest advance as a share of invoice face value, in basis points"
    )]
    pub max_advance_bps: u32,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log filter used when RUST_LOG is not set"
    )]
    pub log_level: String,
}

/// Processing strategy type
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    /// Synchronous CSV iterator
    Sync,
    /// Tokio reader task feeding batches to the engine
    Async,
}

impl CliArgs {
    /// Convert CLI arguments to BatchConfig
    ///
    /// Zero values fall back to the defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_buffered_batches
                .unwrap_or(default.max_buffered_batches),
        )
    }

    /// Protocol configuration with the CLI overrides applied
    ///
    /// Tier rates and reputation policy keep their defaults. The result is
    /// validated when the engine is built.
    pub fn to_protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            admin: Address::new(self.admin.trim()),
            treasury: Address::new(self.treasury.trim()),
            fee_bps: self.fee_bps,
            max_advance_bps: self.max_advance_bps,
            ..ProtocolConfig::default()
        }
    }
}
