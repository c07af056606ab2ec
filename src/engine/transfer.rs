//! Transfer Engine
//!
//! Orchestrates one transfer as an atomic unit: validation, idempotency,
//! ordered control of the two accounts, the debit and credit legs via
//! compare-and-swap, and the one-shot ledger finalize. The account store
//! only offers single-key atomicity; cross-key atomicity is synthesized
//! here with ordered locking, bounded CAS retries, and
//! rollback-by-compensation.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use super::error::TransferError;
use super::locks::AccountLocks;
use crate::account::{AccountStore, AccountStoreError};
use crate::config::RetryConfig;
use crate::core_types::{AccountId, Amount, TransactionId};
use crate::idempotency::{IdempotencyGuard, Reservation};
use crate::ledger::{LedgerError, LedgerStore, Transaction, TxStatus};

/// Result of a committed (or replayed) transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub transaction_id: TransactionId,
    pub from_balance: Amount,
    pub to_balance: Amount,
    /// True when this is the verbatim outcome of an earlier attempt with
    /// the same request key (the gateway answers 200 instead of 201).
    pub replayed: bool,
}

pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    guard: IdempotencyGuard,
    locks: AccountLocks,
    retry: RetryConfig,
}

impl TransferEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            accounts,
            guard: IdempotencyGuard::new(ledger.clone()),
            ledger,
            locks: AccountLocks::new(),
            retry,
        }
    }

    /// Move `amount` minor units from `from` to `to`.
    ///
    /// Validation short-circuits in a fixed order before any side
    /// effect: positive amount, distinct accounts, both accounts exist.
    /// A request key that already completed replays the prior outcome;
    /// one still in flight answers `RetryLater`.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        narration: Option<String>,
        request_key: Option<String>,
    ) -> Result<TransferOutcome, TransferError> {
        if amount == 0 {
            return Err(TransferError::InvalidAmount);
        }
        if from == to {
            return Err(TransferError::SelfTransfer);
        }

        if let Some(ref key) = request_key {
            match self.guard.reserve(key).await? {
                Reservation::Fresh => {}
                Reservation::InProgress => return Err(TransferError::RetryLater),
                Reservation::Completed(prior) => return self.replay(&prior, from, to, amount).await,
            }
        }

        // Both accounts must resolve before anything is persisted.
        self.accounts.get(from).await.map_err(map_store_err)?;
        self.accounts.get(to).await.map_err(map_store_err)?;

        let tx = Transaction::pending(
            TransactionId::new(),
            from,
            to,
            amount,
            narration,
            request_key,
        );
        let tx = match self.ledger.append(tx).await {
            Ok(tx) => tx,
            // Lost the append race to a concurrent duplicate of the same
            // key: never double-execute.
            Err(LedgerError::DuplicateRequestKey(existing)) => {
                return match existing.status {
                    TxStatus::Success => self.replay(&existing, from, to, amount).await,
                    _ => Err(TransferError::RetryLater),
                };
            }
            Err(e) => return Err(e.into()),
        };

        // Fixed-order control of the pair, then the two legs.
        let _guards = self.locks.lock_pair(from, to).await;

        match self.execute_legs(&tx).await {
            Ok((from_balance, to_balance)) => {
                self.finalize_success(&tx).await;
                info!(
                    transaction_id = %tx.id,
                    from, to, amount,
                    "transfer committed"
                );
                Ok(TransferOutcome {
                    transaction_id: tx.id,
                    from_balance,
                    to_balance,
                    replayed: false,
                })
            }
            Err(e) => {
                self.finalize_failed(&tx).await;
                Err(e)
            }
        }
    }

    /// Debit then credit, each through a bounded CAS retry loop.
    ///
    /// Returns the post-transfer balances. If the credit leg fails after
    /// the debit committed, the sender is credited back before the error
    /// propagates; partial application is never left visible.
    async fn execute_legs(&self, tx: &Transaction) -> Result<(Amount, Amount), TransferError> {
        // Debit leg. The funds check runs inside the loop: a conflict
        // means the balance we validated is stale.
        let mut attempt = 0;
        let debited = loop {
            let acct = self.accounts.get(tx.from).await.map_err(map_store_err)?;
            if acct.balance < tx.amount {
                return Err(TransferError::InsufficientFunds);
            }
            match self
                .accounts
                .compare_and_swap(tx.from, acct.version, acct.balance - tx.amount)
                .await
            {
                Ok(updated) => break updated,
                Err(AccountStoreError::VersionConflict { .. }) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(TransferError::ConcurrencyConflict);
                    }
                    self.backoff(attempt).await;
                }
                Err(e) => return Err(map_store_err(e)),
            }
        };

        // Credit leg. Any failure here happens after money left the
        // sender, so it must be compensated.
        let mut attempt = 0;
        let credit_err = loop {
            let acct = match self.accounts.get(tx.to).await {
                Ok(a) => a,
                Err(e) => break map_store_err(e),
            };
            let Some(new_balance) = acct.balance.checked_add(tx.amount) else {
                break TransferError::Internal(format!(
                    "credit overflow on account {}",
                    tx.to
                ));
            };
            match self
                .accounts
                .compare_and_swap(tx.to, acct.version, new_balance)
                .await
            {
                Ok(updated) => return Ok((debited.balance, updated.balance)),
                Err(AccountStoreError::VersionConflict { .. }) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        break TransferError::ConcurrencyConflict;
                    }
                    self.backoff(attempt).await;
                }
                Err(e) => break map_store_err(e),
            }
        };

        warn!(
            transaction_id = %tx.id,
            error = %credit_err,
            "credit leg failed after debit, compensating sender"
        );
        self.compensate(tx).await?;
        Err(credit_err)
    }

    /// Credit the sender back after a failed credit leg.
    ///
    /// Gets twice the normal retry budget: giving up here strands funds.
    async fn compensate(&self, tx: &Transaction) -> Result<(), TransferError> {
        let mut attempt = 0;
        let budget = self.retry.max_attempts * 2;
        loop {
            let refund = match self.accounts.get(tx.from).await {
                Ok(acct) => acct.balance.checked_add(tx.amount).map(|b| (acct.version, b)),
                Err(AccountStoreError::Unavailable(_)) if attempt < budget => {
                    attempt += 1;
                    self.backoff(attempt).await;
                    continue;
                }
                Err(_) => None,
            };
            let Some((version, new_balance)) = refund else {
                break;
            };
            match self
                .accounts
                .compare_and_swap(tx.from, version, new_balance)
                .await
            {
                Ok(_) => {
                    info!(transaction_id = %tx.id, "compensation applied, sender restored");
                    return Ok(());
                }
                Err(AccountStoreError::VersionConflict { .. })
                | Err(AccountStoreError::Unavailable(_))
                    if attempt < budget =>
                {
                    attempt += 1;
                    self.backoff(attempt).await;
                }
                Err(_) => break,
            }
        }

        error!(
            transaction_id = %tx.id,
            from = tx.from,
            amount = tx.amount,
            "COMPENSATION FAILED: debit committed but refund impossible, manual reconciliation required"
        );
        Err(TransferError::CompensationFailed {
            transaction: tx.id,
        })
    }

    /// Replay the outcome of a completed attempt with the same key.
    ///
    /// The key must be bound to the same parameters: a reuse with a
    /// different recipient or amount is a client bug and is rejected
    /// rather than silently answered with the unrelated prior outcome.
    async fn replay(
        &self,
        prior: &Transaction,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferOutcome, TransferError> {
        if prior.from != from || prior.to != to || prior.amount != amount {
            warn!(
                transaction_id = %prior.id,
                "request key reused with different parameters"
            );
            return Err(TransferError::RequestKeyMismatch);
        }
        let from_acct = self.accounts.get(prior.from).await.map_err(map_store_err)?;
        let to_acct = self.accounts.get(prior.to).await.map_err(map_store_err)?;
        info!(transaction_id = %prior.id, "idempotent replay, returning prior outcome");
        Ok(TransferOutcome {
            transaction_id: prior.id,
            from_balance: from_acct.balance,
            to_balance: to_acct.balance,
            replayed: true,
        })
    }

    async fn finalize_success(&self, tx: &Transaction) {
        // Balances are already committed; a finalize failure here must
        // not undo the transfer, only escalate.
        if let Err(e) = self.ledger.finalize(tx.id, TxStatus::Success).await {
            error!(
                transaction_id = %tx.id,
                error = %e,
                "ledger finalize(success) failed after commit, manual reconciliation required"
            );
        }
    }

    async fn finalize_failed(&self, tx: &Transaction) {
        if let Err(e) = self.ledger.finalize(tx.id, TxStatus::Failed).await {
            warn!(transaction_id = %tx.id, error = %e, "ledger finalize(failed) did not apply");
        }
    }

    /// Capped exponential backoff with jitter between CAS retries.
    async fn backoff(&self, attempt: u32) {
        let exp = self
            .retry
            .base_backoff_ms
            .saturating_mul(1u64 << attempt.min(6));
        let capped = exp.min(self.retry.max_backoff_ms);
        let jitter = rand::thread_rng().gen_range(0..=self.retry.base_backoff_ms.max(1));
        tokio::time::sleep(Duration::from_millis(capped + jitter)).await;
    }
}

fn map_store_err(e: AccountStoreError) -> TransferError {
    TransferError::from(e)
}
