//! PostgreSQL Ledger Store
//!
//! Row locks are `SELECT ... FOR UPDATE`; balance changes are a single
//! `UPDATE ... SET balance = balance + $1 ... RETURNING` so the arithmetic
//! always runs against the stored value. The `balance >= 0` check constraint
//! backs up the executor's own check.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::error::TransferError;
use super::store::{AccountReader, LedgerStore, LedgerTx};
use super::types::{Account, AccountId, Entry, Transfer, TransferId};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at";

/// PostgreSQL-backed ledger (clones share the pool)
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ledger lines of one account, newest first
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, TransferError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at FROM entries
            WHERE account_id = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Get a transfer record by id
    pub async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>, TransferError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transfer)
    }
}

#[async_trait]
impl AccountReader for PgLedger {
    async fn get_account(&self, id: AccountId) -> Result<Account, TransferError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TransferError::AccountNotFound)
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> Result<PgLedgerTx, TransferError> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerTx { tx })
    }
}

/// Open PostgreSQL transaction (rolled back on drop)
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, TransferError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(TransferError::AccountNotFound)?;

        debug!(account_id = id, balance = %account.balance, "Locked account row");
        Ok(account)
    }

    async fn add_account_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, TransferError> {
        // Conditional update: a row that would go negative is not touched and
        // comes back as None, told apart from a missing row below.
        let updated = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts SET balance = balance + $1
            WHERE id = $2 AND balance + $1 >= 0
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(delta)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(account) = updated {
            return Ok(account);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match exists {
            Some(_) => Err(TransferError::InsufficientBalance),
            None => Err(TransferError::AccountNotFound),
        }
    }

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Entry, TransferError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transfer, TransferError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transfer)
    }

    async fn commit(self) -> Result<(), TransferError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), TransferError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
