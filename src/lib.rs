//! Fundflow - Account Ledger / Transfer Engine
//!
//! Atomic two-account transfers under concurrency, without relying on a
//! database transaction spanning both accounts.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, Amount, TransactionId)
//! - [`account`] - Account store: balances with optimistic version counters
//! - [`ledger`] - Append-only transaction ledger with cursor pagination
//! - [`idempotency`] - Request-key reservation over the ledger
//! - [`engine`] - Transfer engine: ordered locking, CAS retries, compensation
//! - [`directory`] - Recipient resolution (email or account id)
//! - [`verification`] - OTP verification provider client
//! - [`user_auth`] - Bearer-token verification and request-subject injection
//! - [`gateway`] - axum REST surface with OpenAPI docs
//! - [`config`] - YAML configuration per environment
//! - [`logging`] - tracing setup with rolling file output

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod config;
pub mod directory;
pub mod engine;
pub mod idempotency;
pub mod ledger;
pub mod logging;
pub mod user_auth;
pub mod verification;

pub mod gateway;

// Convenient re-exports at crate root
pub use account::{Account, AccountStore, AccountStoreError, MemAccountStore, PgAccountStore};
pub use config::{AppConfig, RetryConfig};
pub use core_types::{AccountId, Amount, TransactionId, Version};
pub use directory::{DirectoryEntry, DirectoryResolver, MemDirectory};
pub use engine::{TransferEngine, TransferError, TransferOutcome};
pub use idempotency::{IdempotencyGuard, Reservation};
pub use ledger::{
    Cursor, LedgerError, LedgerStore, MemLedgerStore, PgLedgerStore, Transaction, TransactionPage,
    TxStatus,
};
