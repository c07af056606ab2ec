//! Ordered per-account locks.
//!
//! Every transfer takes control of exactly two accounts. Acquisition is
//! always in ascending account-id order, never call order, so A->B and
//! B->A can never hold one lock each and wait on the other.
//!
//! These locks serialize in-process writers only; the version check in
//! `AccountStore::compare_and_swap` remains the cross-process guard.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core_types::AccountId;

#[derive(Default)]
pub(crate) struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().clone()
    }

    /// Lock two distinct accounts in the fixed global order.
    pub async fn lock_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let lo_guard = self.handle(lo).lock_owned().await;
        let hi_guard = self.handle(hi).lock_owned().await;
        (lo_guard, hi_guard)
    }
}
