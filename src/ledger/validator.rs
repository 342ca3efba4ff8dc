//! Transfer Validator
//!
//! Side-effect-free admission checks, run before any mutation. Checks are
//! ordered so that cheap, I/O-free rejections happen first and the
//! destination account is only read once the source side has passed.
//!
//! The validator reads snapshots that may be stale by the time the executor
//! runs; the executor re-checks the balance under the row lock.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use super::error::TransferError;
use super::service::TransferCommand;
use super::store::AccountReader;
use super::types::AccountId;

/// Proof that a request passed validation
///
/// Only [`TransferValidator::validate`] can build one, and
/// [`TransferExecutor::execute`](super::executor::TransferExecutor::execute)
/// only accepts one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: Decimal,
}

impl ValidatedTransfer {
    pub fn from_account_id(&self) -> AccountId {
        self.from_account_id
    }

    pub fn to_account_id(&self) -> AccountId {
        self.to_account_id
    }

    /// Strictly positive amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Parse a decimal amount literal
///
/// `InvalidAmount` for anything `Decimal` cannot hold exactly (empty,
/// non-numeric, more than 28 significant digits), `NegativeAmount` for `<= 0`.
/// Exponent form (`"1e3"`) is accepted.
pub fn parse_amount(s: &str) -> Result<Decimal, TransferError> {
    // from_str would round past the precision limit
    let amount = Decimal::from_str_exact(s).map_err(|_| TransferError::InvalidAmount)?;
    if amount <= Decimal::ZERO {
        return Err(TransferError::NegativeAmount);
    }
    Ok(amount)
}

pub struct TransferValidator<R> {
    accounts: R,
}

impl<R: AccountReader> TransferValidator<R> {
    pub fn new(accounts: R) -> Self {
        Self { accounts }
    }

    /// Decide whether a transfer request is admissible
    ///
    /// Fails fast in this order: amount format, amount sign, source lookup,
    /// source ownership, source balance, destination lookup, currency.
    /// Lookup errors are returned unchanged.
    pub async fn validate(&self, cmd: &TransferCommand) -> Result<ValidatedTransfer, TransferError> {
        let amount = parse_amount(&cmd.amount)?;

        let from = self.accounts.get_account(cmd.from_account_id).await?;

        if from.owner != cmd.requesting_username {
            debug!(
                account_id = from.id,
                requester = %cmd.requesting_username,
                "Transfer rejected: requester does not own source account"
            );
            return Err(TransferError::InvalidOwner);
        }

        if from.balance < amount {
            debug!(
                account_id = from.id,
                balance = %from.balance,
                amount = %amount,
                "Transfer rejected: insufficient balance"
            );
            return Err(TransferError::InsufficientBalance);
        }

        let to = self.accounts.get_account(cmd.to_account_id).await?;

        if from.currency != to.currency {
            debug!(
                from_currency = %from.currency,
                to_currency = %to.currency,
                "Transfer rejected: currency mismatch"
            );
            return Err(TransferError::CurrencyMismatch);
        }

        Ok(ValidatedTransfer {
            from_account_id: from.id,
            to_account_id: to.id,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{Account, Currency};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Account reader that records which ids were looked up
    struct MockReader {
        accounts: HashMap<AccountId, Account>,
        lookups: Mutex<Vec<AccountId>>,
        fail_with: Option<TransferError>,
    }

    impl MockReader {
        fn new(accounts: Vec<Account>) -> Self {
            Self {
                accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
                lookups: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn lookups(&self) -> Vec<AccountId> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountReader for &MockReader {
        async fn get_account(&self, id: AccountId) -> Result<Account, TransferError> {
            self.lookups.lock().unwrap().push(id);
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            self.accounts
                .get(&id)
                .cloned()
                .ok_or(TransferError::AccountNotFound)
        }
    }

    fn account(id: AccountId, owner: &str, balance: &str, currency: Currency) -> Account {
        Account {
            id,
            owner: owner.to_string(),
            balance: Decimal::from_str(balance).unwrap(),
            currency,
            created_at: Utc::now(),
        }
    }

    fn fixture() -> MockReader {
        MockReader::new(vec![
            account(1, "alice", "1000", Currency::Usd),
            account(2, "bob", "1000", Currency::Usd),
            account(3, "carol", "1000", Currency::Eur),
        ])
    }

    fn cmd(from: AccountId, to: AccountId, amount: &str, user: &str) -> TransferCommand {
        TransferCommand {
            from_account_id: from,
            to_account_id: to,
            amount: amount.to_string(),
            requesting_username: user.to_string(),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), Ok(Decimal::from(100)));
        assert_eq!(parse_amount("0.01"), Ok(Decimal::from_str("0.01").unwrap()));
        assert_eq!(parse_amount(""), Err(TransferError::InvalidAmount));
        assert_eq!(parse_amount("abc"), Err(TransferError::InvalidAmount));
        assert_eq!(parse_amount("1.2.3"), Err(TransferError::InvalidAmount));
        assert_eq!(parse_amount("0"), Err(TransferError::NegativeAmount));
        assert_eq!(parse_amount("-50"), Err(TransferError::NegativeAmount));
        assert_eq!(parse_amount("1e3"), Ok(Decimal::from(1000)));
    }

    #[test]
    fn test_parse_amount_rejects_lossy_literals() {
        // Would round to zero
        assert_eq!(
            parse_amount("0.000000000000000000000000000001"),
            Err(TransferError::InvalidAmount)
        );
        // Would round to 100
        assert_eq!(
            parse_amount("100.000000000000000000000000001"),
            Err(TransferError::InvalidAmount)
        );
        // 28 significant digits still fit
        assert_eq!(
            parse_amount("1.000000000000000000000000001"),
            Ok(Decimal::from_str("1.000000000000000000000000001").unwrap())
        );
    }

    #[tokio::test]
    async fn test_valid_transfer() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        let validated = validator.validate(&cmd(1, 2, "100", "alice")).await.unwrap();
        assert_eq!(validated.from_account_id(), 1);
        assert_eq!(validated.to_account_id(), 2);
        assert_eq!(validated.amount(), Decimal::from(100));
        assert_eq!(reader.lookups(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bad_amount_performs_no_lookups() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        let err = validator.validate(&cmd(1, 2, "-50", "alice")).await;
        assert_eq!(err, Err(TransferError::NegativeAmount));

        let err = validator.validate(&cmd(1, 2, "ten", "alice")).await;
        assert_eq!(err, Err(TransferError::InvalidAmount));

        assert!(reader.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_never_reads_destination() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        // Balance would also fail; ownership is reported first
        let err = validator.validate(&cmd(1, 2, "10000", "mallory")).await;
        assert_eq!(err, Err(TransferError::InvalidOwner));
        assert_eq!(reader.lookups(), vec![1]);
    }

    #[tokio::test]
    async fn test_insufficient_balance() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        let err = validator.validate(&cmd(1, 2, "10000", "alice")).await;
        assert_eq!(err, Err(TransferError::InsufficientBalance));
        assert_eq!(reader.lookups(), vec![1]);
    }

    #[tokio::test]
    async fn test_full_balance_is_allowed() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        assert!(validator.validate(&cmd(1, 2, "1000", "alice")).await.is_ok());
    }

    #[tokio::test]
    async fn test_currency_mismatch() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        let err = validator.validate(&cmd(1, 3, "100", "alice")).await;
        assert_eq!(err, Err(TransferError::CurrencyMismatch));
    }

    #[tokio::test]
    async fn test_lookup_errors_propagate_unchanged() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);

        let err = validator.validate(&cmd(99, 2, "100", "alice")).await;
        assert_eq!(err, Err(TransferError::AccountNotFound));

        let err = validator.validate(&cmd(1, 99, "100", "alice")).await;
        assert_eq!(err, Err(TransferError::AccountNotFound));

        let mut failing = fixture();
        failing.fail_with = Some(TransferError::Internal);
        let validator = TransferValidator::new(&failing);
        let err = validator.validate(&cmd(1, 2, "100", "alice")).await;
        assert_eq!(err, Err(TransferError::Internal));
    }

    #[tokio::test]
    async fn test_validation_is_repeatable() {
        let reader = fixture();
        let validator = TransferValidator::new(&reader);
        let request = cmd(1, 3, "100", "alice");

        let first = validator.validate(&request).await;
        let second = validator.validate(&request).await;
        assert_eq!(first, second);
    }
}
