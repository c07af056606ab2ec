//! Directory Resolver
//!
//! External collaborator that maps an email (or raw id) to an account
//! identifier and supplies the display entry for a counterpart in
//! history views. The transfer core consumes it as a capability trait;
//! the directory service itself lives outside this crate.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;

use crate::core_types::AccountId;

/// Display entry for a counterpart account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub account_id: AccountId,
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    /// Resolve an email address or decimal account id to an account id.
    async fn resolve(&self, email_or_id: &str) -> Option<AccountId>;

    /// Look up the display entry for an account.
    async fn entry(&self, account: AccountId) -> Option<DirectoryEntry>;
}

/// In-memory directory used in mock-api mode and tests.
#[derive(Default)]
pub struct MemDirectory {
    by_email: DashMap<String, AccountId>,
    entries: DashMap<AccountId, DirectoryEntry>,
}

impl MemDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, entry: DirectoryEntry) {
        self.by_email
            .insert(entry.email.to_lowercase(), entry.account_id);
        self.entries.insert(entry.account_id, entry);
    }
}

#[async_trait]
impl DirectoryResolver for MemDirectory {
    async fn resolve(&self, email_or_id: &str) -> Option<AccountId> {
        if let Ok(id) = email_or_id.parse::<AccountId>() {
            if self.entries.contains_key(&id) {
                return Some(id);
            }
        }
        self.by_email.get(&email_or_id.to_lowercase()).map(|r| *r)
    }

    async fn entry(&self, account: AccountId) -> Option<DirectoryEntry> {
        self.entries.get(&account).map(|e| e.clone())
    }
}
