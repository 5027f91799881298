//! Wave-scheduled concurrent batch processing
//!
//! # Design
//!
//! A batch of ledger commands is split into waves. A command is placed in the
//! wave after the last wave that already holds a command touching one of its
//! resources (accounts, and the request key if it has one). Consequently:
//!
//! - no two commands in a wave touch the same resource, so a wave can run
//!   fully in parallel without lock contention
//! - commands sharing a resource keep their input order across waves
//!
//! The final ledger state therefore equals a sequential replay of the batch.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<LedgerService>  (shared core)
//!     └── max_in_flight       (bound on concurrently executing commands)
//! ```
//!
//! The core is synchronous, so each command runs on tokio's blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::error;

use crate::core::ledger::LedgerService;
use crate::core::traits::AccountStore;
use crate::types::{AccountId, LedgerCommand, LedgerError};

/// Result of executing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was executed
    pub command: LedgerCommand,

    /// The confirmation message or the error
    pub result: Result<String, LedgerError>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Resource<'a> {
    Account(&'a AccountId),
    Request(&'a str),
}

fn resources(command: &LedgerCommand) -> Vec<Resource<'_>> {
    let mut resources: Vec<Resource<'_>> = command
        .accounts()
        .into_iter()
        .map(Resource::Account)
        .collect();
    if let LedgerCommand::Transaction {
        request_id: Some(key),
        ..
    } = command
    {
        resources.push(Resource::Request(key));
    }
    resources
}

/// Split a batch into waves of commands with pairwise-disjoint resources
///
/// # Guarantees
///
/// - Each command appears in exactly one wave
/// - Commands sharing an account or request key appear in input order
/// - Within a wave, commands keep their relative input order
pub fn schedule_waves(batch: Vec<LedgerCommand>) -> Vec<Vec<LedgerCommand>> {
    let mut assignments = Vec::with_capacity(batch.len());
    {
        let mut last_wave: HashMap<Resource<'_>, usize> = HashMap::new();
        for command in &batch {
            let touched = resources(command);
            let wave = touched
                .iter()
                .filter_map(|r| last_wave.get(r))
                .map(|w| w + 1)
                .max()
                .unwrap_or(0);
            for resource in touched {
                last_wave.insert(resource, wave);
            }
            assignments.push(wave);
        }
    }

    let mut waves: Vec<Vec<LedgerCommand>> = Vec::new();
    for (command, wave) in batch.into_iter().zip(assignments) {
        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(command);
    }
    waves
}

/// Concurrent batch executor over a shared ledger
pub struct BatchProcessor<S> {
    ledger: Arc<LedgerService<S>>,
    max_in_flight: usize,
}

impl<S> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        BatchProcessor {
            ledger: Arc::clone(&self.ledger),
            max_in_flight: self.max_in_flight,
        }
    }
}

impl<S: AccountStore + 'static> BatchProcessor<S> {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `ledger` - shared ledger the commands are executed against
    /// * `max_in_flight` - maximum number of commands executing at once (at least 1)
    pub fn new(ledger: Arc<LedgerService<S>>, max_in_flight: usize) -> Self {
        BatchProcessor {
            ledger,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Execute a batch wave by wave
    ///
    /// # Returns
    ///
    /// One `ProcessingResult` per command. Results are grouped by wave and may
    /// be reordered within a wave.
    ///
    /// # Guarantees
    ///
    /// - All commands are executed, even if some fail
    /// - A wave starts only after the previous wave has finished
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());

        for wave in schedule_waves(batch) {
            let tasks = wave.into_iter().map(|command| {
                let ledger = Arc::clone(&self.ledger);
                tokio::task::spawn_blocking(move || {
                    let result = ledger.execute(&command);
                    ProcessingResult { command, result }
                })
            });

            let outcomes: Vec<_> = stream::iter(tasks)
                .buffer_unordered(self.max_in_flight)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    Ok(result) => results.push(result),
                    Err(e) => error!("Task panicked: {:?}", e),
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::store::InMemoryAccountStore;
    use crate::types::{Currency, TransactionRequest};
    use rust_decimal::Decimal;

    fn id(raw: &str) -> AccountId {
        AccountId::new(raw)
    }

    fn deposit(raw: &str, amount: i64) -> LedgerCommand {
        TransactionRequest::deposit(id(raw), Decimal::new(amount, 0), Currency::Usd).into()
    }

    fn transfer(from: &str, to: &str, amount: i64) -> LedgerCommand {
        TransactionRequest::transfer(id(from), id(to), Decimal::new(amount, 0), Currency::Usd)
            .into()
    }

    #[test]
    fn test_disjoint_commands_share_a_wave() {
        let waves = schedule_waves(vec![deposit("A", 1), deposit("B", 1), deposit("C", 1)]);
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].len(), 3);
    }

    #[test]
    fn test_shared_account_orders_waves() {
        let batch = vec![
            deposit("A", 1),
            transfer("A", "B", 1),
            deposit("C", 1),
            LedgerCommand::Close(id("B")),
        ];
        let waves = schedule_waves(batch.clone());

        assert_eq!(
            waves,
            vec![
                vec![batch[0].clone(), batch[2].clone()],
                vec![batch[1].clone()],
                vec![batch[3].clone()],
            ]
        );
    }

    #[test]
    fn test_request_key_orders_waves() {
        let keyed = |raw: &str| LedgerCommand::Transaction {
            request: TransactionRequest::deposit(id(raw), Decimal::ONE, Currency::Usd),
            request_id: Some("same".to_string()),
        };
        let waves = schedule_waves(vec![keyed("A"), keyed("B")]);
        assert_eq!(waves.len(), 2);
    }

    #[test]
    fn test_empty_batch_has_no_waves() {
        assert!(schedule_waves(Vec::new()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_matches_sequential_replay() {
        let store = Arc::new(InMemoryAccountStore::default());
        let ledger = Arc::new(LedgerService::new(store, &LedgerConfig::default()).unwrap());
        let a = ledger.open_account("a", Currency::Usd).unwrap().id;
        let b = ledger.open_account("b", Currency::Usd).unwrap().id;

        let amount = |n| Decimal::new(n, 0);
        let batch: Vec<LedgerCommand> = vec![
            TransactionRequest::deposit(a.clone(), amount(100), Currency::Usd).into(),
            TransactionRequest::transfer(a.clone(), b.clone(), amount(60), Currency::Usd).into(),
            TransactionRequest::withdrawal(a.clone(), amount(50), Currency::Usd).into(),
            TransactionRequest::withdrawal(b.clone(), amount(60), Currency::Usd).into(),
            LedgerCommand::Close(b.clone()),
        ];

        let processor = BatchProcessor::new(Arc::clone(&ledger), 4);
        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().filter(|r| r.result.is_err()).count(), 1);
        assert_eq!(ledger.account(&a).unwrap().balance, amount(40));
        assert!(!ledger.account(&b).unwrap().is_active());
    }
}
