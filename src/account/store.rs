//! Account Store contract and in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::models::Account;
use crate::core_types::{AccountId, Amount, Version};

/// Account store errors
#[derive(Error, Debug, Clone)]
pub enum AccountStoreError {
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Version conflict on account {account}: expected {expected}, actual {actual}")]
    VersionConflict {
        account: AccountId,
        expected: Version,
        actual: Version,
    },

    #[error("Account store unavailable: {0}")]
    Unavailable(String),
}

/// Durable keyed storage of versioned balances.
///
/// `compare_and_swap` is deliberately the only write operation. There is
/// no add/subtract helper: every caller must carry the version it read
/// and handle `VersionConflict`, which is what makes lost updates
/// impossible.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch the current balance and version of an account.
    async fn get(&self, id: AccountId) -> Result<Account, AccountStoreError>;

    /// Atomically replace the balance and bump the version, but only if
    /// the stored version still equals `expected_version`.
    ///
    /// Returns the updated record on success.
    async fn compare_and_swap(
        &self,
        id: AccountId,
        expected_version: Version,
        new_balance: Amount,
    ) -> Result<Account, AccountStoreError>;
}

/// In-memory account store backed by a concurrent map.
///
/// Used by tests and by the in-process (mock-api) service mode. Each CAS
/// runs under the shard lock of the account's entry, so the
/// check-and-update is atomic per account.
#[derive(Default)]
pub struct MemAccountStore {
    accounts: DashMap<AccountId, Account>,
}

impl MemAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Account opening is external to the transfer core;
    /// this exists for wiring and tests only.
    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }
}

#[async_trait]
impl AccountStore for MemAccountStore {
    async fn get(&self, id: AccountId) -> Result<Account, AccountStoreError> {
        self.accounts
            .get(&id)
            .map(|a| *a)
            .ok_or(AccountStoreError::NotFound(id))
    }

    async fn compare_and_swap(
        &self,
        id: AccountId,
        expected_version: Version,
        new_balance: Amount,
    ) -> Result<Account, AccountStoreError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or(AccountStoreError::NotFound(id))?;

        if entry.version != expected_version {
            return Err(AccountStoreError::VersionConflict {
                account: id,
                expected: expected_version,
                actual: entry.version,
            });
        }

        entry.balance = new_balance;
        entry.version += 1;
        Ok(*entry)
    }
}
