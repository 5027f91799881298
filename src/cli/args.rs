use crate::config::{ConfigError, LedgerConfig};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay ledger commands against a set of bank accounts
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Replay deposits, withdrawals, transfers and account lifecycle commands", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger commands
    #[arg(value_name = "INPUT", help = "Path to the commands CSV file")]
    pub input_file: PathBuf,

    /// Accounts to seed the ledger with
    #[arg(
        long = "accounts",
        value_name = "ACCOUNTS",
        help = "Path to the accounts CSV file (account,currency,balance,status,owner)"
    )]
    pub accounts_file: Option<PathBuf>,

    /// Processing strategy to use for replaying commands
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for wave-parallel"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of commands executing at once (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of commands executing concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Maximum wait for exclusive access to an account
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        env = "LEDGER_LOCK_TIMEOUT_MS",
        help = "Milliseconds to wait for exclusive access to an account (default: 5000)"
    )]
    pub lock_timeout_ms: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced by
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create the ledger configuration
    ///
    /// Starts from the `LEDGER_*` environment and applies the CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable holds an invalid value.
    pub fn to_ledger_config(&self) -> Result<LedgerConfig, ConfigError> {
        let mut config = LedgerConfig::from_env()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut LedgerConfig) {
        if let Some(millis) = self.lock_timeout_ms {
            config.lock_timeout = Duration::from_millis(millis);
        }
    }
}
