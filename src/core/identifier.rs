//! Account identifier generation and validation
//!
//! Identifiers follow an IBAN-like layout:
//!
//! ```text
//! BY 59 BANK 0000000000000042
//! │  │  │    └── 16-digit account body
//! │  │  └─────── 4-letter bank code
//! │  └────────── 2-digit check value
//! └───────────── 2-letter country code
//! ```
//!
//! The check value is computed with ISO 7064 MOD 97-10: the first four
//! characters are moved to the end, every letter is replaced by its position
//! plus nine (`A` = 10 … `Z` = 35), the resulting digit string is read as an
//! integer `n`, and the check value is `98 - (n mod 97)`. A correct identifier
//! therefore satisfies `n mod 97 == 1` when the check value is left in place.
//!
//! The digit string is up to 34 digits long, so it is evaluated with
//! arbitrary precision integers.

use crate::types::{AccountId, LedgerError};
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::Rng;
use regex::Regex;

/// Default country code
pub const DEFAULT_COUNTRY_CODE: &str = "BY";

/// Default bank code
pub const DEFAULT_BANK_CODE: &str = "BANK";

const BODY_DIGITS: u32 = 16;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2})(\d{2})([A-Z]{4})(\d{16})$").expect("Invalid identifier regex pattern")
});

/// Generator and validator for account identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbanCodec {
    country: String,
    bank: String,
}

impl IbanCodec {
    /// Create a codec for the given country and bank codes
    ///
    /// # Arguments
    ///
    /// * `country` - two upper-case ASCII letters
    /// * `bank` - four upper-case ASCII letters
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if either code has the wrong shape.
    pub fn new(country: &str, bank: &str) -> Result<Self, LedgerError> {
        if !is_upper_alpha(country, 2) {
            return Err(LedgerError::invalid_identifier(country));
        }
        if !is_upper_alpha(bank, 4) {
            return Err(LedgerError::invalid_identifier(bank));
        }

        Ok(IbanCodec {
            country: country.to_string(),
            bank: bank.to_string(),
        })
    }

    /// Country code every generated identifier starts with
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Bank code embedded in generated identifiers
    pub fn bank(&self) -> &str {
        &self.bank
    }

    /// Generate a fresh identifier with a random body
    ///
    /// The body is drawn from the operating system's random source. Uniqueness
    /// against existing accounts is enforced by the store on insertion, not here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if no check value can be computed for the
    /// candidate.
    pub fn generate(&self) -> Result<AccountId, LedgerError> {
        let body: u64 = OsRng.gen_range(0..10u64.pow(BODY_DIGITS));
        let body = format!("{:0width$}", body, width = BODY_DIGITS as usize);
        let candidate = format!("{}00{}{}", self.country, self.bank, body);

        let check = self.checksum(&candidate)?;
        Ok(AccountId::new(format!(
            "{}{}{}{}",
            self.country, check, self.bank, body
        )))
    }

    /// Compute the two-digit check value of a candidate
    ///
    /// The candidate's check field (characters 3 and 4) should hold `00`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if the candidate is shorter than five
    /// characters or contains anything other than `A-Z` and `0-9`.
    pub fn checksum(&self, candidate: &str) -> Result<String, LedgerError> {
        check_value(candidate).ok_or_else(|| LedgerError::invalid_identifier(candidate))
    }

    /// Whether `identifier` is well formed for this codec and carries a
    /// correct check value
    pub fn validate(&self, identifier: &str) -> bool {
        let Some(captures) = IDENTIFIER_PATTERN.captures(identifier) else {
            return false;
        };
        if &captures[1] != self.country {
            return false;
        }

        let candidate = format!("{}00{}{}", &captures[1], &captures[3], &captures[4]);
        match check_value(&candidate) {
            Some(expected) => expected == captures[2],
            None => false,
        }
    }

    /// Validate an identifier coming from outside the ledger
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if [`IbanCodec::validate`] rejects it.
    pub fn parse(&self, identifier: &str) -> Result<AccountId, LedgerError> {
        let identifier = identifier.trim();
        if self.validate(identifier) {
            Ok(AccountId::new(identifier))
        } else {
            Err(LedgerError::invalid_identifier(identifier))
        }
    }
}

impl Default for IbanCodec {
    fn default() -> Self {
        IbanCodec {
            country: DEFAULT_COUNTRY_CODE.to_string(),
            bank: DEFAULT_BANK_CODE.to_string(),
        }
    }
}

fn is_upper_alpha(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_uppercase())
}

/// MOD 97-10 check value, or `None` if the candidate is not checkable
fn check_value(candidate: &str) -> Option<String> {
    if candidate.len() < 5
        || !candidate
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return None;
    }

    let digits = expand(candidate);
    let value = BigUint::parse_bytes(digits.as_bytes(), 10)?;
    let remainder = (value % 97u32).to_u32_digits().first().copied().unwrap_or(0);

    Some(format!("{:02}", 98 - remainder))
}

/// Rotate the first four characters to the end and map letters to numbers
fn expand(candidate: &str) -> String {
    let (head, tail) = candidate.split_at(4);
    tail.chars()
        .chain(head.chars())
        .filter_map(|c| c.to_digit(36))
        .map(|d| d.to_string())
        .collect()
}
