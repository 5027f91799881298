//! End-to-end integration tests
//!
//! These tests replay predefined CSV fixtures through the complete pipeline.
//! Each test:
//! 1. Seeds the ledger from accounts.csv in a fixture directory
//! 2. Replays every command in input.csv
//! 3. Writes the final account states to a temporary file
//! 4. Compares the output with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path deposits, withdrawals and transfers
//! - Overdraft attempts and opposing transfers
//! - Currency mismatches
//! - Close, reopen and delete flows
//! - Invalid requests (missing fields, unknown accounts, same-account transfers)
//! - Request keys replayed or reused for a different request
//! - Malformed command and account rows
//!
//! Each test is run twice: once with the sequential strategy and once with the
//! wave-parallel async strategy. Both must produce byte-identical output.

#[cfg(test)]
mod tests {
    use bank_ledger_engine::cli::StrategyType;
    use bank_ledger_engine::config::LedgerConfig;
    use bank_ledger_engine::strategy::create_strategy;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a fixture by replaying input.csv against accounts.csv and comparing
    /// with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file is missing or the output does not match.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let accounts_path = format!("{}/accounts.csv", fixture_dir);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        for path in [&accounts_path, &input_path, &expected_path] {
            assert!(Path::new(path).exists(), "Fixture file not found: {}", path);
        }

        let strategy = create_strategy(strategy_type, None, LedgerConfig::default());
        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(
                Some(Path::new(&accounts_path)),
                Path::new(&input_path),
                &mut temp_output,
            )
            .unwrap_or_else(|e| panic!("Failed to replay commands: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path")]
    #[case("insufficient_funds")]
    #[case("opposing_transfers")]
    #[case("currency_mismatch")]
    #[case("account_lifecycle")]
    #[case("invalid_requests")]
    #[case("idempotent_requests")]
    #[case("malformed_data")]
    #[case("multiple_accounts")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    #[rstest]
    fn test_missing_accounts_file_is_fatal(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let strategy = create_strategy(strategy, None, LedgerConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(
            Some(Path::new("tests/fixtures/does_not_exist/accounts.csv")),
            Path::new("tests/fixtures/happy_path/input.csv"),
            &mut output,
        );

        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[rstest]
    fn test_without_accounts_file_every_command_fails(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let strategy = create_strategy(strategy, None, LedgerConfig::default());
        let mut output = Vec::new();

        strategy
            .process(
                None,
                Path::new("tests/fixtures/happy_path/input.csv"),
                &mut output,
            )
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,currency,balance,status,owner\n"
        );
    }
}
