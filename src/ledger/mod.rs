//! Ledger Store
//!
//! Append-only, immutable record of transfer attempts, queryable by
//! account with stable newest-first pagination. The request-key
//! uniqueness constraint here is what backs the idempotency guard.

pub mod cursor;
pub mod db;
pub mod store;
pub mod types;

pub use cursor::Cursor;
pub use db::PgLedgerStore;
pub use store::{LedgerError, LedgerStore, MemLedgerStore, TransactionPage};
pub use types::{Transaction, TxStatus};
