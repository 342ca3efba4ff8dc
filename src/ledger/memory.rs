//! In-Memory Ledger Store
//!
//! Process-local implementation of the store seams, used by tests and local
//! demos. It behaves like the PostgreSQL store where it matters:
//!
//! - every account row has its own async mutex (the row lock), held by a unit
//!   of work until it ends
//! - snapshot reads see the last committed row and never wait for row locks
//! - a unit of work stages its writes and publishes them only on commit, so
//!   rollback and drop both discard everything

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use super::error::TransferError;
use super::store::{AccountReader, LedgerStore, LedgerTx};
use super::types::{Account, AccountId, Currency, Entry, Transfer};

struct Row {
    lock: Arc<tokio::sync::Mutex<()>>,
    committed: RwLock<Account>,
}

impl Row {
    fn read(&self) -> Account {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Default)]
struct Tables {
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

struct Inner {
    accounts: DashMap<AccountId, Arc<Row>>,
    tables: Mutex<Tables>,
    /// Commits publish under the write side so readers never see half a transfer
    commit_gate: RwLock<()>,
    next_account_id: AtomicI64,
    next_entry_id: AtomicI64,
    next_transfer_id: AtomicI64,
}

impl Inner {
    fn row(&self, id: AccountId) -> Option<Arc<Row>> {
        self.accounts.get(&id).map(|r| Arc::clone(r.value()))
    }
}

/// In-process ledger (cheap to clone, clones share state)
#[derive(Clone)]
pub struct MemoryLedger {
    inner: Arc<Inner>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                accounts: DashMap::new(),
                tables: Mutex::new(Tables::default()),
                commit_gate: RwLock::new(()),
                next_account_id: AtomicI64::new(1),
                next_entry_id: AtomicI64::new(1),
                next_transfer_id: AtomicI64::new(1),
            }),
        }
    }

    /// Seed an account (negative opening balances are rejected)
    pub fn open_account(
        &self,
        owner: &str,
        currency: Currency,
        balance: Decimal,
    ) -> Result<Account, TransferError> {
        if balance < Decimal::ZERO {
            return Err(TransferError::InvalidAmount);
        }

        let account = Account {
            id: self.inner.next_account_id.fetch_add(1, Ordering::SeqCst),
            owner: owner.to_string(),
            balance,
            currency,
            created_at: Utc::now(),
        };
        self.inner.accounts.insert(
            account.id,
            Arc::new(Row {
                lock: Arc::new(tokio::sync::Mutex::new(())),
                committed: RwLock::new(account.clone()),
            }),
        );
        Ok(account)
    }

    /// Committed accounts, ordered by id
    pub fn accounts(&self) -> Vec<Account> {
        let _gate = self
            .inner
            .commit_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut accounts: Vec<Account> = self
            .inner
            .accounts
            .iter()
            .map(|r| r.value().read())
            .collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }

    /// Committed entries, ordered by id
    pub fn entries(&self) -> Vec<Entry> {
        let tables = self
            .inner
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut entries = tables.entries.clone();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// Committed entries of one account, ordered by id
    pub fn entries_for(&self, account_id: AccountId) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.account_id == account_id)
            .collect()
    }

    /// Committed transfers, ordered by id
    pub fn transfers(&self) -> Vec<Transfer> {
        let tables = self
            .inner
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut transfers = tables.transfers.clone();
        transfers.sort_by_key(|t| t.id);
        transfers
    }
}

#[async_trait]
impl AccountReader for MemoryLedger {
    async fn get_account(&self, id: AccountId) -> Result<Account, TransferError> {
        let _gate = self
            .inner
            .commit_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner
            .row(id)
            .map(|row| row.read())
            .ok_or(TransferError::AccountNotFound)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, TransferError> {
        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            held: BTreeMap::new(),
            staged: BTreeMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        })
    }
}

/// Open unit of work against a [`MemoryLedger`]
///
/// Holds its row locks until commit, rollback or drop.
pub struct MemoryTx {
    inner: Arc<Inner>,
    held: BTreeMap<AccountId, (Arc<Row>, OwnedMutexGuard<()>)>,
    /// In-transaction rows, one per held lock
    staged: BTreeMap<AccountId, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl MemoryTx {
    fn account_exists(&self, id: AccountId) -> bool {
        self.staged.contains_key(&id) || self.inner.accounts.contains_key(&id)
    }

    /// Ids of the rows this unit of work currently holds locked
    pub fn locked_ids(&self) -> Vec<AccountId> {
        self.held.keys().copied().collect()
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, TransferError> {
        if let Some(account) = self.staged.get(&id) {
            return Ok(account.clone());
        }

        let row = self.inner.row(id).ok_or(TransferError::AccountNotFound)?;
        let guard = Arc::clone(&row.lock).lock_owned().await;
        let current = row.read();

        self.staged.insert(id, current.clone());
        self.held.insert(id, (row, guard));
        Ok(current)
    }

    async fn add_account_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, TransferError> {
        if !self.staged.contains_key(&id) {
            self.lock_account(id).await?;
        }

        let account = self.staged.get_mut(&id).ok_or(TransferError::Internal)?;
        let next = account
            .balance
            .checked_add(delta)
            .ok_or(TransferError::Internal)?;
        if next < Decimal::ZERO {
            return Err(TransferError::InsufficientBalance);
        }

        account.balance = next;
        Ok(account.clone())
    }

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Entry, TransferError> {
        if !self.account_exists(account_id) {
            return Err(TransferError::AccountNotFound);
        }

        let entry = Entry {
            id: self.inner.next_entry_id.fetch_add(1, Ordering::SeqCst),
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transfer, TransferError> {
        if !self.account_exists(from_account_id) || !self.account_exists(to_account_id) {
            return Err(TransferError::AccountNotFound);
        }

        let transfer = Transfer {
            id: self.inner.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn commit(self) -> Result<(), TransferError> {
        let MemoryTx {
            inner,
            held,
            staged,
            entries,
            transfers,
        } = self;

        {
            let _gate = inner
                .commit_gate
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            for (id, account) in staged {
                if let Some((row, _)) = held.get(&id) {
                    *row.committed.write().unwrap_or_else(PoisonError::into_inner) = account;
                }
            }

            let mut tables = inner.tables.lock().unwrap_or_else(PoisonError::into_inner);
            tables.entries.extend(entries);
            tables.transfers.extend(transfers);
        }

        // Row locks are released only after the new rows are visible
        drop(held);
        Ok(())
    }

    async fn rollback(self) -> Result<(), TransferError> {
        Ok(())
    }
}
