//! Transfer Service
//!
//! Transfer-request entry point: validator first, executor second.
//! The requesting username comes from the authentication layer and is
//! trusted as-is.

use std::time::Duration;

use tracing::{info, warn};

use super::error::TransferError;
use super::executor::TransferExecutor;
use super::store::{AccountReader, LedgerStore};
use super::types::{Account, AccountId, TransferResult};
use super::validator::TransferValidator;

/// Transfer request from API layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommand {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    /// Decimal literal, e.g. `"100"` or `"12.50"`
    pub amount: String,
    /// Authenticated requester
    pub requesting_username: String,
}

pub struct TransferService<S> {
    validator: TransferValidator<S>,
    executor: TransferExecutor<S>,
    accounts: S,
}

impl<S> TransferService<S>
where
    S: AccountReader + LedgerStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            validator: TransferValidator::new(store.clone()),
            executor: TransferExecutor::new(store.clone()),
            accounts: store,
        }
    }

    /// Bound every unit of work by `timeout`
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    /// Validate then atomically execute one transfer
    pub async fn transfer(&self, cmd: TransferCommand) -> Result<TransferResult, TransferError> {
        let validated = match self.validator.validate(&cmd).await {
            Ok(v) => v,
            Err(e) => {
                info!(
                    from = cmd.from_account_id,
                    to = cmd.to_account_id,
                    amount = %cmd.amount,
                    requester = %cmd.requesting_username,
                    code = e.code(),
                    "Transfer rejected by validation"
                );
                return Err(e);
            }
        };

        match self.executor.execute(validated).await {
            Ok(result) => {
                info!(
                    transfer_id = result.transfer.id,
                    from = result.transfer.from_account_id,
                    to = result.transfer.to_account_id,
                    amount = %result.transfer.amount,
                    requester = %cmd.requesting_username,
                    "Transfer committed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    from = cmd.from_account_id,
                    to = cmd.to_account_id,
                    amount = %cmd.amount,
                    code = e.code(),
                    "Transfer aborted during execution"
                );
                Err(e)
            }
        }
    }

    /// Account snapshot, visible to its owner only
    pub async fn account(
        &self,
        id: AccountId,
        requesting_username: &str,
    ) -> Result<Account, TransferError> {
        let account = self.accounts.get_account(id).await?;
        if account.owner != requesting_username {
            return Err(TransferError::InvalidOwner);
        }
        Ok(account)
    }
}
