//! Store Seams
//!
//! Traits the validator and executor are written against. Implemented by
//! [`PgLedger`](super::postgres::PgLedger) and
//! [`MemoryLedger`](super::memory::MemoryLedger).

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::TransferError;
use super::types::{Account, AccountId, Entry, Transfer};

/// Account-read collaborator
///
/// Snapshot read, no locks. `AccountNotFound` when the id is unknown,
/// `Internal` for anything else.
#[async_trait]
pub trait AccountReader: Send + Sync {
    async fn get_account(&self, id: AccountId) -> Result<Account, TransferError>;
}

/// Unit-of-work factory
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Open a new atomic unit of work
    async fn begin(&self) -> Result<Self::Tx, TransferError>;
}

/// One open unit of work
///
/// Dropping the value without calling [`commit`](LedgerTx::commit) discards
/// every change made through it.
#[async_trait]
pub trait LedgerTx: Send + Sized {
    /// Acquire the row mutation lock and return the current row
    ///
    /// The lock is held until the unit of work ends. Locking a row this unit
    /// of work already holds returns the in-transaction row without waiting.
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, TransferError>;

    /// Add `delta` to the stored balance and return the updated row
    ///
    /// Fails with `InsufficientBalance` if the result would be negative.
    async fn add_account_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, TransferError>;

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Entry, TransferError>;

    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transfer, TransferError>;

    async fn commit(self) -> Result<(), TransferError>;

    async fn rollback(self) -> Result<(), TransferError>;
}
