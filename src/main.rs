//! Bank Ledger CLI
//!
//! Command-line interface for replaying ledger commands from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv commands.csv > accounts_out.csv
//! cargo run -- --strategy sync --accounts accounts.csv commands.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv
//! RUST_LOG=info cargo run -- --lock-timeout-ms 250 --accounts accounts.csv commands.csv
//! ```
//!
//! The program seeds the ledger from the accounts file, replays every command
//! in the input file, and writes the final account states to stdout. Logs go
//! to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, invalid configuration, etc.)

use bank_ledger_engine::cli;
use bank_ledger_engine::logging;
use bank_ledger_engine::strategy;
use std::process;

fn main() {
    logging::init();

    let args = cli::parse_args();

    let ledger_config = match args.to_ledger_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let strategy = {
        let batch_config = if args.strategy == cli::StrategyType::Async {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, batch_config, ledger_config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(args.accounts_file.as_deref(), &args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
