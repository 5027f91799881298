//! Ledger commands replayed by the driver
//!
//! A command is either a money movement or a lifecycle transition. Commands
//! report the accounts they touch so the batch processor can schedule
//! non-conflicting commands concurrently.

use super::account::AccountId;
use super::transaction::TransactionRequest;

/// One line of work for the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    /// Apply a money movement, at most once per `request_id` when one is given
    Transaction {
        request: TransactionRequest,
        request_id: Option<String>,
    },

    /// Close an active, empty account
    Close(AccountId),

    /// Reopen a closed account
    Reopen(AccountId),

    /// Remove a closed account
    Delete(AccountId),
}

impl LedgerCommand {
    /// Every account the command reads or writes
    pub fn accounts(&self) -> Vec<&AccountId> {
        match self {
            LedgerCommand::Transaction { request, .. } => request.accounts(),
            LedgerCommand::Close(id) | LedgerCommand::Reopen(id) | LedgerCommand::Delete(id) => {
                vec![id]
            }
        }
    }
}

impl From<TransactionRequest> for LedgerCommand {
    fn from(request: TransactionRequest) -> Self {
        LedgerCommand::Transaction {
            request,
            request_id: None,
        }
    }
}
