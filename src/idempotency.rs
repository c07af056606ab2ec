//! Idempotency Guard
//!
//! Deduplicates transfer requests carrying the same client-supplied
//! request key. Backed entirely by the ledger's request-key constraint:
//! a pending holder means a first attempt is still in flight, a
//! successful holder means the outcome can be replayed, and a failed
//! holder does not block a retry.

use std::sync::Arc;

use crate::ledger::{LedgerError, LedgerStore, Transaction, TxStatus};

/// Result of reserving a request key before execution.
#[derive(Debug, Clone)]
pub enum Reservation {
    /// No live entry holds this key; proceed with a fresh execution.
    Fresh,
    /// A first attempt with this key is still pending. The caller must
    /// not double-execute; it is told to retry later.
    InProgress,
    /// A prior attempt completed; its outcome is returned verbatim.
    Completed(Box<Transaction>),
}

pub struct IdempotencyGuard {
    ledger: Arc<dyn LedgerStore>,
}

impl IdempotencyGuard {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    pub async fn reserve(&self, request_key: &str) -> Result<Reservation, LedgerError> {
        match self.ledger.find_by_request_key(request_key).await? {
            None => Ok(Reservation::Fresh),
            Some(tx) => match tx.status {
                TxStatus::Pending => Ok(Reservation::InProgress),
                TxStatus::Success => Ok(Reservation::Completed(Box::new(tx))),
                // Explicit failures release the key for a retry.
                TxStatus::Failed => Ok(Reservation::Fresh),
            },
        }
    }
}
