//! Transfer Executor
//!
//! Applies a validated transfer inside one unit of work:
//!
//! ```text
//! BEGIN
//!   lock min(from, to)          -- ascending id order, always
//!   lock max(from, to)
//!   from.balance -= amount      -- fails if it would go negative
//!   to.balance   += amount
//!   INSERT entry (from, -amount)
//!   INSERT entry (to,   +amount)
//!   INSERT transfer (from, to, amount)
//! COMMIT
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Lock Order**: row locks are taken in ascending account id, so two
//!    transfers over the same pair in opposite directions can never wait on
//!    each other in a cycle.
//! 2. **Executor Is The Authority**: the balance check happens again here
//!    against the locked row, not the validator's snapshot.
//! 3. **All Or Nothing**: any failure (including cancellation, which drops the
//!    unit of work) rolls everything back.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::TransferError;
use super::store::{LedgerStore, LedgerTx};
use super::types::{AccountId, TransferResult};
use super::validator::ValidatedTransfer;

/// Row lock acquisition order for a transfer between `a` and `b`
///
/// Returns one id for a self-transfer.
pub fn lock_order(a: AccountId, b: AccountId) -> Vec<AccountId> {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => vec![a, b],
        std::cmp::Ordering::Greater => vec![b, a],
        std::cmp::Ordering::Equal => vec![a],
    }
}

pub struct TransferExecutor<S> {
    store: S,
    timeout: Option<Duration>,
}

impl<S: LedgerStore> TransferExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bound the whole unit of work; on expiry it is rolled back
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Atomically apply a validated transfer
    pub async fn execute(&self, transfer: ValidatedTransfer) -> Result<TransferResult, TransferError> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run(&transfer)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        from = transfer.from_account_id(),
                        to = transfer.to_account_id(),
                        timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        "Transfer unit of work timed out, rolled back"
                    );
                    Err(TransferError::Internal)
                }
            },
            None => self.run(&transfer).await,
        }
    }

    async fn run(&self, transfer: &ValidatedTransfer) -> Result<TransferResult, TransferError> {
        let mut tx = self.store.begin().await?;

        match apply(&mut tx, transfer).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "Rollback failed; unit of work discarded on drop");
                }
                Err(e)
            }
        }
    }
}

async fn apply<T: LedgerTx>(
    tx: &mut T,
    transfer: &ValidatedTransfer,
) -> Result<TransferResult, TransferError> {
    let from_id = transfer.from_account_id();
    let to_id = transfer.to_account_id();
    let amount = transfer.amount();

    for id in lock_order(from_id, to_id) {
        tx.lock_account(id).await?;
        debug!(account_id = id, "Row lock acquired");
    }

    let mut from_account = tx.add_account_balance(from_id, -amount).await?;
    let to_account = tx.add_account_balance(to_id, amount).await?;
    if from_id == to_id {
        from_account = to_account.clone();
    }

    let from_entry = tx.create_entry(from_id, -amount).await?;
    let to_entry = tx.create_entry(to_id, amount).await?;
    debug_assert_eq!(from_entry.amount + to_entry.amount, Decimal::ZERO);

    let record = tx.create_transfer(from_id, to_id, amount).await?;

    Ok(TransferResult {
        transfer: record,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}
