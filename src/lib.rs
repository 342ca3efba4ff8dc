//! Banking Ledger - double-entry funds-transfer engine
//!
//! # Modules
//!
//! - [`ledger`] - Transfer core: validator, executor, store seams and stores
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`gateway`] - HTTP boundary (axum)
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use ledger::{
    Account, AccountId, Currency, Entry, MemoryLedger, PgLedger, Transfer, TransferCommand,
    TransferError, TransferResult, TransferService,
};
