//! Ledger configuration
//!
//! Tunables of the ledger core with defaults, overridable from `LEDGER_*`
//! environment variables. The CLI applies its own overrides on top.
//!
//! # Environment Variables
//!
//! - `LEDGER_LOCK_TIMEOUT_MS`: maximum wait for exclusive access to an account (default: 5000)
//! - `LEDGER_CACHE_CAPACITY`: account cache capacity (default: 500)
//! - `LEDGER_CACHE_TTL_SECS`: account cache time-to-live (default: 1800)
//! - `LEDGER_COUNTRY_CODE`: identifier country code (default: "BY")
//! - `LEDGER_BANK_CODE`: identifier bank code (default: "BANK")

use crate::core::identifier::{IbanCodec, DEFAULT_BANK_CODE, DEFAULT_COUNTRY_CODE};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default maximum wait for exclusive access to one account
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of accounts kept in the read cache
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

/// Default lifetime of a cached account
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Name of the variable
        key: String,
        /// Why the value was rejected
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Ledger core configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Maximum wait for exclusive access to one account
    pub lock_timeout: Duration,

    /// Maximum number of accounts kept in the read cache
    pub cache_capacity: usize,

    /// Lifetime of a cached account
    pub cache_ttl: Duration,

    /// Country code of generated identifiers
    pub country_code: String,

    /// Bank code of generated identifiers
    pub bank_code: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            bank_code: DEFAULT_BANK_CODE.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from the process environment
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be
    /// parsed, or if the identifier codes are malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = LedgerConfig::default();

        let lock_timeout = parse_optional::<u64, _>(&lookup, "LEDGER_LOCK_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.lock_timeout);
        let cache_capacity = parse_optional::<usize, _>(&lookup, "LEDGER_CACHE_CAPACITY")?
            .unwrap_or(defaults.cache_capacity);
        let cache_ttl = parse_optional::<u64, _>(&lookup, "LEDGER_CACHE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let country_code = lookup("LEDGER_COUNTRY_CODE").unwrap_or(defaults.country_code);
        let bank_code = lookup("LEDGER_BANK_CODE").unwrap_or(defaults.bank_code);

        let config = LedgerConfig {
            lock_timeout,
            cache_capacity,
            cache_ttl,
            country_code,
            bank_code,
        };
        config.codec()?;

        Ok(config)
    }

    /// Build the identifier codec for the configured codes
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending code.
    pub fn codec(&self) -> Result<IbanCodec, ConfigError> {
        IbanCodec::new(&self.country_code, &self.bank_code).map_err(|_| {
            ConfigError::invalid(
                "LEDGER_COUNTRY_CODE/LEDGER_BANK_CODE",
                format!(
                    "expected 2 and 4 upper-case letters, got '{}' and '{}'",
                    self.country_code, self.bank_code
                ),
            )
        })
    }
}

fn parse_optional<T, L>(lookup: &L, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = LedgerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("LEDGER_LOCK_TIMEOUT_MS", "250"),
            ("LEDGER_CACHE_CAPACITY", "10"),
            ("LEDGER_CACHE_TTL_SECS", "60"),
            ("LEDGER_COUNTRY_CODE", "PL"),
            ("LEDGER_BANK_CODE", "ABCD"),
        ]))
        .unwrap();

        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.cache_capacity, 10);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.codec().unwrap().country(), "PL");
    }

    #[test]
    fn test_unparsable_number_names_the_key() {
        let result = LedgerConfig::from_lookup(lookup_from(&[("LEDGER_CACHE_CAPACITY", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "LEDGER_CACHE_CAPACITY"
        ));
    }

    #[test]
    fn test_malformed_codes_are_rejected() {
        let result = LedgerConfig::from_lookup(lookup_from(&[("LEDGER_BANK_CODE", "bank")]));
        assert!(result.is_err());
    }
}
