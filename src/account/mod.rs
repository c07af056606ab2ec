//! Account Store
//!
//! Durable keyed storage of account balances with optimistic-version
//! metadata. `compare_and_swap` is the sole mutation primitive: no caller
//! can change a balance without also handling version-conflict retries.

pub mod db;
pub mod models;
pub mod store;

pub use db::PgAccountStore;
pub use models::Account;
pub use store::{AccountStore, AccountStoreError, MemAccountStore};
