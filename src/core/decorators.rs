//! Processing decorators
//!
//! Cross-cutting behaviour is added by wrapping a [`TransactionProcessor`]
//! in another one rather than by intercepting calls at runtime.

use crate::core::traits::TransactionProcessor;
use crate::types::{ErrorKind, LedgerError, TransactionReceipt, TransactionRequest};
use std::time::Instant;
use tracing::{error, info, info_span, warn};

/// Logs every request processed by the wrapped processor
///
/// Each request runs inside a `transaction` span. Successes are logged at
/// `info`, rejections at `warn`, infrastructure failures at `error`.
#[derive(Debug)]
pub struct TracedProcessor<P> {
    inner: P,
}

impl<P: TransactionProcessor> TracedProcessor<P> {
    pub fn new(inner: P) -> Self {
        TracedProcessor { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: TransactionProcessor> TransactionProcessor for TracedProcessor<P> {
    fn process(&self, request: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        let span = info_span!("transaction", kind = %request.kind());
        let _guard = span.enter();

        let description = request.to_string();
        let started = Instant::now();
        let result = self.inner.process(request);
        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        match &result {
            Ok(receipt) => {
                info!(request = %description, elapsed_us, "{}", receipt.message);
            }
            Err(e) if e.kind() == ErrorKind::Infrastructure => {
                error!(request = %description, elapsed_us, error = %e, "transaction failed");
            }
            Err(e) => {
                warn!(request = %description, elapsed_us, kind = %e.kind(), error = %e, "transaction rejected");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, Currency};
    use rust_decimal::Decimal;

    struct Fixed(Result<TransactionReceipt, LedgerError>);

    impl TransactionProcessor for Fixed {
        fn process(&self, _: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
            self.0.clone()
        }
    }

    fn request() -> TransactionRequest {
        TransactionRequest::deposit(AccountId::new("A"), Decimal::ONE, Currency::Usd)
    }

    #[test]
    fn test_success_passes_through() {
        let receipt = TransactionReceipt::success("Deposit success: +1 USD");
        let traced = TracedProcessor::new(Fixed(Ok(receipt.clone())));

        assert_eq!(traced.process(request()), Ok(receipt));
    }

    #[test]
    fn test_errors_pass_through_unchanged() {
        let failure = LedgerError::lock_timeout(&AccountId::new("A"), 5);
        let traced = TracedProcessor::new(Fixed(Err(failure.clone())));

        assert_eq!(traced.process(request()), Err(failure));
    }
}
