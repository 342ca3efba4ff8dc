//! Funds Transfer Core
//!
//! Moves money between two accounts with double-entry bookkeeping.
//!
//! # Flow
//!
//! ```text
//! TransferCommand ──▶ TransferValidator ──▶ ValidatedTransfer ──▶ TransferExecutor ──▶ TransferResult
//!                      (snapshot reads)                            (one unit of work)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Conservation**: the two entries of a transfer sum to zero, and the
//!    two balances move by the same magnitude in opposite directions
//! 2. **Non-Negativity**: no committed balance is ever below zero
//! 3. **Atomicity**: a failed transfer leaves no balance change, entry or
//!    transfer row behind
//! 4. **Deadlock Freedom**: row locks are always taken in ascending account id

pub mod error;
pub mod executor;
pub mod memory;
pub mod postgres;
pub mod service;
pub mod store;
pub mod types;
pub mod validator;


// Re-exports for convenience
pub use error::TransferError;
pub use executor::TransferExecutor;
pub use memory::MemoryLedger;
pub use postgres::PgLedger;
pub use service::{TransferCommand, TransferService};
pub use store::{AccountReader, LedgerStore, LedgerTx};
pub use types::{Account, AccountId, Currency, Entry, Transfer, TransferResult};
pub use validator::{TransferValidator, ValidatedTransfer};
