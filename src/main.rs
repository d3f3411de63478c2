//! Invoice Settlement Engine CLI
//!
//! Replays an operation log CSV and reports the resulting invoice book.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > invoices.csv
//! cargo run -- --strategy sync operations.csv > invoices.csv
//! cargo run -- --events events.csv --fee-bps 75 operations.csv > invoices.csv
//! RUST_LOG=debug cargo run -- operations.csv > invoices.csv
//! ```
//!
//! The invoice book goes to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations do not affect the exit code)
//! - 1: Error (file not found, invalid configuration, write failure, etc.)

use invoice_settlement_engine::cli;
use invoice_settlement_engine::io::{write_events_csv, write_invoices_csv};
use invoice_settlement_engine::strategy;
use std::fs::File;
use std::io::BufWriter;
use std::process;

fn run(args: cli::CliArgs) -> Result<(), String> {
    let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
        Some(args.to_batch_config())
    } else {
        None
    };
    let protocol_config = args.to_protocol_config();
    let strategy = strategy::create_strategy(args.strategy.clone(), batch_config, protocol_config);

    let engine = strategy.run(&args.input_file)?;

    let mut output = std::io::stdout();
    write_invoices_csv(&engine.invoices(), engine.state().advances(), &mut output)?;

    if let Some(path) = &args.events_file {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        write_events_csv(engine.events(), &mut writer)?;
    }

    Ok(())
}

fn main() {
    let args = cli::parse_args();

    if let Err(e) = invoice_settlement_engine::telemetry::init_logging(&args.log_level) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
