//! At-most-once application of keyed requests
//!
//! Callers that may resubmit a request (after a timeout, a dropped
//! connection, a driver restart) attach a request key. The first successful
//! application under a key is remembered together with its request:
//!
//! - resubmitting the same request returns the remembered receipt and applies
//!   nothing
//! - submitting a different request under the same key is rejected with
//!   `IdempotencyConflict`
//! - failures are not remembered, so a rejected request may be retried under
//!   the same key
//!
//! Submissions sharing a key are serialized; different keys do not contend.

use crate::core::traits::TransactionProcessor;
use crate::types::{LedgerError, TransactionReceipt, TransactionRequest};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct AppliedRequest {
    request: TransactionRequest,
    receipt: TransactionReceipt,
}

#[derive(Debug, Default)]
enum KeyState {
    /// No success yet; a submission may be in flight
    #[default]
    Pending,
    Applied(AppliedRequest),
    /// Left behind by a failed submission and about to leave the map
    Retired,
}

type Record = Arc<Mutex<KeyState>>;

/// Processor wrapper that remembers keyed successes
#[derive(Debug)]
pub struct IdempotentProcessor<P> {
    inner: P,
    applied: DashMap<String, Record>,
}

impl<P: TransactionProcessor> IdempotentProcessor<P> {
    pub fn new(inner: P) -> Self {
        IdempotentProcessor {
            inner,
            applied: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Apply `request` unless a request was already applied under `key`
    ///
    /// A failed submission removes its key from the map, so failures leave
    /// nothing behind.
    ///
    /// # Errors
    ///
    /// - `IdempotencyConflict` if `key` was used for a different request
    /// - any error of the wrapped processor
    pub fn process_once(
        &self,
        key: &str,
        request: TransactionRequest,
    ) -> Result<TransactionReceipt, LedgerError> {
        loop {
            let record = Arc::clone(self.applied.entry(key.to_string()).or_default().value());
            let mut state = record.lock();

            if matches!(*state, KeyState::Retired) {
                // A failed submission is removing this record; take the next one
                drop(state);
                std::thread::yield_now();
                continue;
            }

            if let KeyState::Applied(previous) = &*state {
                if previous.request != request {
                    return Err(LedgerError::idempotency_conflict(key));
                }
                debug!(key, "request already applied, returning stored receipt");
                return Ok(previous.receipt.clone());
            }

            return match self.inner.process(request.clone()) {
                Ok(receipt) => {
                    *state = KeyState::Applied(AppliedRequest {
                        request,
                        receipt: receipt.clone(),
                    });
                    Ok(receipt)
                }
                Err(e) => {
                    *state = KeyState::Retired;
                    drop(state);
                    self.applied
                        .remove_if(key, |_, current| Arc::ptr_eq(current, &record));
                    Err(e)
                }
            };
        }
    }

    /// Number of keys held in the map, including ones with a submission in
    /// flight
    pub fn tracked_keys(&self) -> usize {
        self.applied.len()
    }

    /// Number of keys with a remembered success
    pub fn applied_count(&self) -> usize {
        self.applied
            .iter()
            .filter(|entry| matches!(*entry.value().lock(), KeyState::Applied(_)))
            .count()
    }
}

impl<P: TransactionProcessor> TransactionProcessor for IdempotentProcessor<P> {
    fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        self.inner.process(request)
    }
}
