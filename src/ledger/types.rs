//! Ledger record types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, Amount, TransactionId, now_millis};

/// Outcome state of a transfer attempt.
///
/// A ledger entry is created `Pending` and finalized exactly once to
/// `Success` or `Failed`. Terminal entries are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TxStatus {
    Pending = 0,
    Success = 1,
    Failed = 2,
}

impl TxStatus {
    /// Get numeric ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TxStatus::Pending),
            1 => Some(TxStatus::Success),
            2 => Some(TxStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        }
    }

    /// Terminal entries are immutable
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of one transfer attempt.
///
/// `seq` is assigned by the store at append time; it is the tie-breaker
/// for pagination when two entries share a `created_at` millisecond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub narration: Option<String>,
    pub status: TxStatus,
    pub request_key: Option<String>,
    /// Created timestamp (millis)
    pub created_at: i64,
    /// Finalized timestamp (millis), set by the one-shot finalize
    pub completed_at: Option<i64>,
    /// Store-assigned insertion order
    pub seq: i64,
}

impl Transaction {
    /// Build a new pending entry for a transfer attempt.
    pub fn pending(
        id: TransactionId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        narration: Option<String>,
        request_key: Option<String>,
    ) -> Self {
        Self {
            id,
            from,
            to,
            amount,
            narration,
            status: TxStatus::Pending,
            request_key,
            created_at: now_millis(),
            completed_at: None,
            seq: 0,
        }
    }

    /// True if this account is the sender or the recipient.
    pub fn involves(&self, account: AccountId) -> bool {
        self.from == account || self.to == account
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx[{}] {} -> {} amount={} status={}",
            self.id, self.from, self.to, self.amount, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(TxStatus::from_id(0), Some(TxStatus::Pending));
        assert_eq!(TxStatus::from_id(1), Some(TxStatus::Success));
        assert_eq!(TxStatus::from_id(2), Some(TxStatus::Failed));
        assert_eq!(TxStatus::from_id(3), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TxStatus::Pending.is_terminal());
        assert!(TxStatus::Success.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
    }

    #[test]
    fn test_involves() {
        let tx = Transaction::pending(TransactionId::new(), 1, 2, 30, None, None);
        assert!(tx.involves(1));
        assert!(tx.involves(2));
        assert!(!tx.involves(3));
    }
}
