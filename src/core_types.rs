//! Core type definitions shared across the crate.
//!
//! All amounts are integer minor units (e.g. cents, satoshi). Floating
//! point never enters the ledger: `u64` plus checked arithmetic is the
//! only representation of money.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account identifier. Numeric ascending order of account ids is the
/// fixed global order used when taking control of two accounts.
pub type AccountId = u64;

/// Balance / transfer amount in minor units.
pub type Amount = u64;

/// Optimistic-concurrency version counter, bumped on every successful
/// balance mutation.
pub type Version = u64;

/// Transaction ID type - ULID-based unique identifier
///
/// Using ULID provides:
/// - Monotonic, sortable IDs
/// - No coordination needed (no machine_id)
/// - 128-bit with good entropy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(ulid::Ulid);

impl TransactionId {
    /// Generate a new unique TransactionId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Current UTC time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_unique() {
        let id1 = TransactionId::new();
        let id2 = TransactionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_transaction_id_roundtrip() {
        let id = TransactionId::new();
        let parsed: TransactionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_transaction_id_rejects_garbage() {
        assert!("not-a-ulid".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_transaction_id_serializes_as_plain_string() {
        let id = TransactionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
