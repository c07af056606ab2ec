//! Transfer Engine
//!
//! The central coordinator: validation, idempotency, ordered control of
//! the two accounts, CAS debit/credit with bounded retries, and
//! compensation on partial failure.

pub mod error;
mod locks;
pub mod transfer;


pub use error::TransferError;
pub use transfer::{TransferEngine, TransferOutcome};
