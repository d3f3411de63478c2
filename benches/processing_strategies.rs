//! Benchmark suite for comparing processing strategies
//!
//! Compares the synchronous and asynchronous strategies using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Benchmark Inputs
//!
//! Each input is generated into a temporary file before timing starts. It
//! holds the setup operations followed by `cycles` full invoice lifecycles
//! (create, advance, pay) spread over ten sellers.

use divan::Bencher;
use invoice_settlement_engine::cli::StrategyType;
use invoice_settlement_engine::config::ProtocolConfig;
use invoice_settlement_engine::strategy::{create_strategy, BatchConfig};
use std::io::Write;
use tempfile::NamedTempFile;

const SELLERS: usize = 10;
const THIRTY_DAYS: u64 = 30 * 86_400;

fn main() {
    divan::main();
}

fn generate_operations(cycles: usize) -> NamedTempFile {
    let mut csv = String::from("type,time,caller,invoice,target,role,amount,due,meta\n");
    for seller in 0..SELLERS {
        csv.push_str(&format!("grant,0,admin,,seller{},issuer,,,\n", seller));
    }
    csv.push_str("fund,0,admin,,lp,,1000000,,\n");
    csv.push_str(&format!("fund,0,admin,,buyer,,{},,\n", cycles * 1000));
    csv.push_str("deposit,0,lp,,,,1000000,,\n");

    for i in 0..cycles {
        let seller = i % SELLERS;
        let at = 1_000 + i as u64;
        let id = i + 1;
        csv.push_str(&format!(
            "create,{at},seller{seller},,buyer,,1000,{due},0x{id:x}\n\
             advance,{at},seller{seller},{id},,,800,,\n\
             pay,{at},buyer,{id},,,1000,,\n",
            due = at + THIRTY_DAYS,
        ));
    }

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(csv.as_bytes())
        .expect("Failed to write operations");
    file.flush().expect("Failed to flush operations");
    file
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn sync_strategy(bencher: Bencher, cycles: usize) {
    let input = generate_operations(cycles);
    let strategy = create_strategy(StrategyType::Sync, None, ProtocolConfig::default());

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(input.path(), &mut output)
            .expect("Processing failed");
        output
    });
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn async_strategy(bencher: Bencher, cycles: usize) {
    let input = generate_operations(cycles);
    let strategy = create_strategy(
        StrategyType::Async,
        Some(BatchConfig::default()),
        ProtocolConfig::default(),
    );

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(input.path(), &mut output)
            .expect("Processing failed");
        output
    });
}
