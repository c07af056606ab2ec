//! Ledger Store contract and in-memory implementation.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::cursor::Cursor;
use super::types::{Transaction, TxStatus};
use crate::core_types::{AccountId, TransactionId, now_millis};

/// Ledger store errors
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    /// A non-failed entry with the same request key already exists.
    /// Carries that entry so callers can surface the prior outcome.
    #[error("Duplicate request key: {}", .0.id)]
    DuplicateRequestKey(Box<Transaction>),

    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Double-finalize attempts are rejected loudly so double-completion
    /// bugs surface instead of being silently absorbed.
    #[error("Transaction {id} already finalized as {status}")]
    AlreadyFinalized { id: TransactionId, status: TxStatus },

    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),
}

/// One page of a history query, newest first.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// Position to resume from; absent when the sequence is exhausted.
    pub next_cursor: Option<Cursor>,
}

/// Append-only, immutable record of transfer attempts.
///
/// Entries are appended in `Pending` state and finalized exactly once.
/// No in-place edits exist other than that single transition.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new `Pending` entry, assigning its `seq`.
    ///
    /// Rejects with `DuplicateRequestKey` if a non-failed entry with the
    /// same request key already exists. Failed attempts do not consume
    /// the key: a client retry after an explicit failure re-executes.
    async fn append(&self, tx: Transaction) -> Result<Transaction, LedgerError>;

    /// One-shot `Pending -> Success | Failed` transition.
    async fn finalize(
        &self,
        id: TransactionId,
        status: TxStatus,
    ) -> Result<Transaction, LedgerError>;

    /// Look up the entry currently holding a request key, preferring the
    /// non-failed one.
    async fn find_by_request_key(&self, key: &str)
    -> Result<Option<Transaction>, LedgerError>;

    /// Newest-first page of entries where the account is sender or
    /// recipient. Restartable via the opaque cursor.
    async fn list_by_account(
        &self,
        account: AccountId,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<TransactionPage, LedgerError>;
}

/// In-memory ledger backed by concurrent maps.
///
/// `by_key` indexes the entry currently holding each request key; a
/// failed entry is displaced when a retry claims the key again.
#[derive(Default)]
pub struct MemLedgerStore {
    entries: DashMap<TransactionId, Transaction>,
    by_key: DashMap<String, TransactionId>,
    seq: AtomicI64,
}

impl MemLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemLedgerStore {
    async fn append(&self, mut tx: Transaction) -> Result<Transaction, LedgerError> {
        debug_assert_eq!(tx.status, TxStatus::Pending);

        // The key-index entry lock makes check-then-claim atomic against
        // a racing duplicate, and is held until the transaction is
        // visible in `entries`: released earlier, a concurrent append
        // could find the key claimed by an id it cannot resolve and take
        // it over.
        let _claim = match tx.request_key.clone() {
            Some(key) => {
                let mut claimed = self.by_key.entry(key).or_insert(tx.id);
                if *claimed != tx.id {
                    if let Some(existing) = self.entries.get(&*claimed) {
                        if existing.status != TxStatus::Failed {
                            return Err(LedgerError::DuplicateRequestKey(Box::new(
                                existing.clone(),
                            )));
                        }
                    }
                    // Previous attempt failed: the retry takes over the
                    // key.
                    *claimed = tx.id;
                }
                Some(claimed)
            }
            None => None,
        };

        tx.seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.entries.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn finalize(
        &self,
        id: TransactionId,
        status: TxStatus,
    ) -> Result<Transaction, LedgerError> {
        debug_assert!(status.is_terminal());

        let mut entry = self.entries.get_mut(&id).ok_or(LedgerError::NotFound(id))?;
        if entry.status.is_terminal() {
            return Err(LedgerError::AlreadyFinalized {
                id,
                status: entry.status,
            });
        }

        entry.status = status;
        entry.completed_at = Some(now_millis());
        Ok(entry.clone())
    }

    async fn find_by_request_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let Some(id) = self.by_key.get(key).map(|r| *r) else {
            return Ok(None);
        };
        Ok(self.entries.get(&id).map(|e| e.clone()))
    }

    async fn list_by_account(
        &self,
        account: AccountId,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<TransactionPage, LedgerError> {
        let mut matches: Vec<Transaction> = self
            .entries
            .iter()
            .filter(|e| e.involves(account))
            .filter(|e| match &cursor {
                Some(c) => c.admits(e.created_at, e.seq),
                None => true,
            })
            .map(|e| e.clone())
            .collect();

        matches.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));

        let has_more = matches.len() > limit;
        matches.truncate(limit);
        let next_cursor = if has_more {
            matches.last().map(|t| Cursor {
                created_at: t.created_at,
                seq: t.seq,
            })
        } else {
            None
        };

        Ok(TransactionPage {
            items: matches,
            next_cursor,
        })
    }
}
