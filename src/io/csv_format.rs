//! CSV format handling for ledger commands and account snapshots
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord / AccountRecord structures for deserialization
//! - Conversion from CSV records to domain types
//! - Account output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Formats
//!
//! Commands: `type,account,to,amount,currency,request_id` where `type` is one
//! of `deposit`, `withdrawal`, `transfer`, `close`, `reopen`, `delete`.
//!
//! Accounts (input and output): `account,currency,balance,status,owner`.

use crate::core::identifier::IbanCodec;
use crate::types::{
    Account, AccountId, AccountStatus, Currency, LedgerCommand, TransactionRequest,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for command deserialization
///
/// Everything but `type` and `account` is optional: lifecycle commands carry
/// no amount, and a money movement with a missing amount or currency is
/// passed on for the validator to reject.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub command_type: String,
    pub account: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// CSV record structure for account seeding
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct AccountRecord {
    pub account: String,
    pub currency: String,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_amount(field: Option<String>) -> Result<Option<Decimal>, String> {
    match non_empty(field) {
        Some(raw) => Decimal::from_str(&raw)
            .map(Some)
            .map_err(|_| format!("Invalid amount '{}'", raw)),
        None => Ok(None),
    }
}

fn parse_currency(field: Option<String>) -> Result<Option<Currency>, String> {
    non_empty(field).map(|raw| raw.parse::<Currency>()).transpose()
}

/// Convert a CsvRecord to a LedgerCommand
///
/// This function:
/// - Parses the command type (case-insensitive)
/// - Parses amount and currency when present; empty fields become `None`
/// - Requires a destination account for transfers
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(LedgerCommand) - Successfully converted command
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LedgerCommand, String> {
    let account_raw = csv_record.account.trim();
    if account_raw.is_empty() {
        return Err(format!(
            "Command '{}' has no account",
            csv_record.command_type
        ));
    }
    let account = AccountId::new(account_raw);

    let command_type = csv_record.command_type.trim().to_lowercase();
    let request = match command_type.as_str() {
        "close" => return Ok(LedgerCommand::Close(account)),
        "reopen" => return Ok(LedgerCommand::Reopen(account)),
        "delete" => return Ok(LedgerCommand::Delete(account)),
        "deposit" => TransactionRequest::Deposit {
            account,
            amount: parse_amount(csv_record.amount)?,
            currency: parse_currency(csv_record.currency)?,
        },
        "withdrawal" => TransactionRequest::Withdrawal {
            account,
            amount: parse_amount(csv_record.amount)?,
            currency: parse_currency(csv_record.currency)?,
        },
        "transfer" => {
            let to = non_empty(csv_record.to).ok_or_else(|| {
                format!("Transfer from {} requires a destination account", account)
            })?;
            TransactionRequest::Transfer {
                from: account,
                to: AccountId::new(to),
                amount: parse_amount(csv_record.amount)?,
                currency: parse_currency(csv_record.currency)?,
            }
        }
        _ => {
            return Err(format!(
                "Invalid command type: '{}' for account {}",
                csv_record.command_type, account
            ))
        }
    };

    Ok(LedgerCommand::Transaction {
        request,
        request_id: non_empty(csv_record.request_id),
    })
}

/// Convert an AccountRecord to an Account
///
/// The identifier must carry a valid check value for `codec`; the balance
/// defaults to zero, the status to ACTIVE and the owner to empty.
///
/// # Errors
///
/// Returns a message if the identifier, currency, balance or status is
/// invalid, if the balance is negative, or if a CLOSED account holds funds.
pub fn convert_account_record(record: AccountRecord, codec: &IbanCodec) -> Result<Account, String> {
    let id = codec.parse(&record.account).map_err(|e| e.to_string())?;
    let currency = record.currency.parse::<Currency>()?;
    let balance = parse_amount(record.balance)?.unwrap_or(Decimal::ZERO);
    if balance < Decimal::ZERO {
        return Err(format!("Negative balance {} for account {}", balance, id));
    }

    let status = match non_empty(record.status) {
        Some(raw) => raw.parse::<AccountStatus>()?,
        None => AccountStatus::Active,
    };
    if status == AccountStatus::Closed && balance > Decimal::ZERO {
        return Err(format!(
            "Closed account {} cannot hold a balance of {}",
            id, balance
        ));
    }

    let mut account = Account::new(id, currency, non_empty(record.owner).unwrap_or_default());
    account.balance = balance;
    account.status = status;
    Ok(account)
}

/// Write account states to CSV format
///
/// Writes accounts in CSV format with columns: account, currency, balance,
/// status, owner. Accounts are sorted by identifier for deterministic output
/// and balances are written with two decimal places.
///
/// # Arguments
///
/// * `accounts` - Slice of account states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "currency", "balance", "status", "owner"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.id.cmp(&b.id));

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.id.to_string(),
                account.currency.to_string(),
                format!("{:.2}", account.balance),
                account.status.to_string(),
                account.owner,
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const A: &str = "BY95BANK0000000000000001";
    const B: &str = "BY68BANK0000000000000002";

    fn record(command_type: &str, amount: Option<&str>, currency: Option<&str>) -> CsvRecord {
        CsvRecord {
            command_type: command_type.to_string(),
            account: A.to_string(),
            to: Some(B.to_string()),
            amount: amount.map(str::to_string),
            currency: currency.map(str::to_string),
            request_id: None,
        }
    }

    #[rstest]
    #[case("deposit", "deposit")]
    #[case("WITHDRAWAL", "withdrawal")]
    #[case("Transfer", "transfer")]
    fn test_convert_money_movements(#[case] command_type: &str, #[case] expected_kind: &str) {
        let command = convert_csv_record(record(command_type, Some("100.50"), Some("usd"))).unwrap();

        let LedgerCommand::Transaction { request, request_id } = command else {
            panic!("expected a transaction");
        };
        assert_eq!(request.kind().to_string(), expected_kind);
        assert_eq!(request_id, None);
        assert_eq!(request.accounts()[0], &AccountId::new(A));
    }

    #[rstest]
    #[case::close("close", LedgerCommand::Close(AccountId::new(A)))]
    #[case::reopen("reopen", LedgerCommand::Reopen(AccountId::new(A)))]
    #[case::delete("DELETE", LedgerCommand::Delete(AccountId::new(A)))]
    fn test_convert_lifecycle_commands(#[case] command_type: &str, #[case] expected: LedgerCommand) {
        assert_eq!(convert_csv_record(record(command_type, None, None)).unwrap(), expected);
    }

    #[test]
    fn test_empty_amount_and_currency_become_none() {
        let command = convert_csv_record(record("deposit", Some("  "), Some(""))).unwrap();
        assert_eq!(
            command,
            LedgerCommand::Transaction {
                request: TransactionRequest::Deposit {
                    account: AccountId::new(A),
                    amount: None,
                    currency: None,
                },
                request_id: None,
            }
        );
    }

    #[test]
    fn test_request_id_is_kept() {
        let mut csv_record = record("deposit", Some("1"), Some("USD"));
        csv_record.request_id = Some(" req-7 ".to_string());

        let command = convert_csv_record(csv_record).unwrap();
        assert!(matches!(
            command,
            LedgerCommand::Transaction { request_id: Some(ref key), .. } if key == "req-7"
        ));
    }

    #[rstest]
    #[case::invalid_type("refund", Some("1"), Some("USD"), "Invalid command type")]
    #[case::invalid_amount("deposit", Some("ten"), Some("USD"), "Invalid amount")]
    #[case::invalid_currency("deposit", Some("1"), Some("XYZ"), "Unsupported currency")]
    fn test_convert_csv_record_errors(
        #[case] command_type: &str,
        #[case] amount: Option<&str>,
        #[case] currency: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(record(command_type, amount, currency));
        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_transfer_requires_destination() {
        let mut csv_record = record("transfer", Some("1"), Some("USD"));
        csv_record.to = None;

        let result = convert_csv_record(csv_record);
        assert!(result.unwrap_err().contains("requires a destination"));
    }

    fn account_record(account: &str, balance: &str, status: &str) -> AccountRecord {
        AccountRecord {
            account: account.to_string(),
            currency: "USD".to_string(),
            balance: Some(balance.to_string()),
            status: Some(status.to_string()),
            owner: Some("alice".to_string()),
        }
    }

    #[test]
    fn test_convert_account_record() {
        let account =
            convert_account_record(account_record(A, "250.00", "active"), &IbanCodec::default())
                .unwrap();

        assert_eq!(account.id, AccountId::new(A));
        assert_eq!(account.balance, Decimal::new(25000, 2));
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.owner, "alice");
    }

    #[rstest]
    #[case::bad_checksum("BY00BANK0000000000000001", "10", "ACTIVE", "Invalid account identifier")]
    #[case::negative_balance(A, "-1", "ACTIVE", "Negative balance")]
    #[case::closed_with_funds(A, "5", "CLOSED", "cannot hold a balance")]
    #[case::unknown_status(A, "0", "FROZEN", "Unknown account status")]
    fn test_convert_account_record_errors(
        #[case] account: &str,
        #[case] balance: &str,
        #[case] status: &str,
        #[case] expected_error: &str,
    ) {
        let result = convert_account_record(
            account_record(account, balance, status),
            &IbanCodec::default(),
        );
        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_write_accounts_csv_sorted_with_two_decimals() {
        let mut first = Account::new(AccountId::new(B), Currency::Eur, "bob");
        first.balance = Decimal::new(15, 1);
        let mut second = Account::new(AccountId::new(A), Currency::Usd, "alice");
        second.status = AccountStatus::Closed;

        let mut output = Vec::new();
        write_accounts_csv(&[first, second], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!(
                "account,currency,balance,status,owner\n{},USD,0.00,CLOSED,alice\n{},EUR,1.50,ACTIVE,bob\n",
                A, B
            )
        );
    }

    #[test]
    fn test_write_empty_accounts() {
        let mut output = Vec::new();
        write_accounts_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,currency,balance,status,owner\n"
        );
    }
}
