//! Transfer Error Types
//!
//! The closed error set the engine exposes to callers; every variant has
//! a stable code and an HTTP status mapping for the gateway.

use thiserror::Error;

use crate::account::AccountStoreError;
use crate::core_types::{AccountId, TransactionId};
use crate::ledger::LedgerError;

/// Transfer error types
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation Errors (terminal, never retried) ===
    #[error("Amount must be a positive number of minor units")]
    InvalidAmount,

    #[error("Sender and recipient account cannot be the same")]
    SelfTransfer,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // === Execution Errors ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Version-conflict retries exhausted under contention. Safe for the
    /// client to retry with the same request key.
    #[error("Concurrent contention on account, retry with the same request key")]
    ConcurrencyConflict,

    /// A request with the same key is still in flight; the caller must
    /// poll or retry rather than double-execute.
    #[error("Request with this key is still in progress")]
    RetryLater,

    /// The request key was already used by a request with different
    /// parameters. Surfaced instead of replaying the prior outcome so
    /// the client bug is visible.
    #[error("Request key was already used with different parameters")]
    RequestKeyMismatch,

    #[error("Durable store unavailable: {0}")]
    StoreUnavailable(String),

    /// Crediting the sender back after a failed second leg itself
    /// failed. The engine cannot self-heal this; it is escalated for
    /// manual reconciliation.
    #[error("Compensation failed for transaction {transaction}, manual reconciliation required")]
    CompensationFailed { transaction: TransactionId },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            TransferError::RetryLater => "RETRY_LATER",
            TransferError::RequestKeyMismatch => "REQUEST_KEY_MISMATCH",
            TransferError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            TransferError::CompensationFailed { .. } => "COMPENSATION_FAILED",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount
            | TransferError::SelfTransfer
            | TransferError::InsufficientFunds => 400,
            TransferError::AccountNotFound(_) => 404,
            TransferError::ConcurrencyConflict
            | TransferError::RetryLater
            | TransferError::RequestKeyMismatch => 409,
            TransferError::StoreUnavailable(_) => 503,
            TransferError::CompensationFailed { .. } | TransferError::Internal(_) => 500,
        }
    }
}

impl From<AccountStoreError> for TransferError {
    fn from(e: AccountStoreError) -> Self {
        match e {
            AccountStoreError::NotFound(id) => TransferError::AccountNotFound(id),
            AccountStoreError::Unavailable(m) => TransferError::StoreUnavailable(m),
            AccountStoreError::VersionConflict { .. } => TransferError::ConcurrencyConflict,
        }
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Unavailable(m) => TransferError::StoreUnavailable(m),
            // Duplicate keys are handled in the transfer flow; reaching
            // here (or a double finalize) is an engine bug surfacing.
            other => TransferError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::SelfTransfer.code(), "SELF_TRANSFER");
        assert_eq!(TransferError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(TransferError::RetryLater.code(), "RETRY_LATER");
        assert_eq!(
            TransferError::RequestKeyMismatch.code(),
            "REQUEST_KEY_MISMATCH"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::InvalidAmount.http_status(), 400);
        assert_eq!(TransferError::AccountNotFound(7).http_status(), 404);
        assert_eq!(TransferError::ConcurrencyConflict.http_status(), 409);
        assert_eq!(TransferError::RequestKeyMismatch.http_status(), 409);
        assert_eq!(TransferError::StoreUnavailable("down".into()).http_status(), 503);
        assert_eq!(
            TransferError::CompensationFailed {
                transaction: crate::core_types::TransactionId::new()
            }
            .http_status(),
            500
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferError::InsufficientFunds.to_string(), "Insufficient funds");
    }
}
