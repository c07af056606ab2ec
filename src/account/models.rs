use crate::core_types::{AccountId, Amount, Version};

/// A single versioned balance record.
///
/// `balance` is a minor-unit amount and cannot go negative (u64 plus
/// checked arithmetic at every mutation site). `version` bumps on every
/// successful mutation and is the optimistic-concurrency token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub balance: Amount,
    pub version: Version,
}

impl Account {
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Self {
            id,
            balance,
            version: 0,
        }
    }
}
