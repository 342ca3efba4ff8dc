//! Ledger Core Types
//!
//! Rows of the three durable collections (accounts, entries, transfers)
//! plus the read-model handed back after a transfer commits.
//!
//! Money is always `rust_decimal::Decimal`. With the `serde` feature it
//! serializes as a decimal string, which is also the at-rest representation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account row id (assigned by the store, always positive)
pub type AccountId = i64;

/// Entry row id (monotonic)
pub type EntryId = i64;

/// Transfer row id (monotonic)
pub type TransferId = i64;

/// Supported account currencies
///
/// Immutable once an account is created. Stored as its upper-case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Rmb,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Rmb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rmb => "RMB",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown currency code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported currency: {0}")]
pub struct ParseCurrencyError(pub String);

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "RMB" => Ok(Currency::Rmb),
            _ => Err(ParseCurrencyError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = ParseCurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Account row
///
/// `balance` is never negative; only the transfer executor mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: AccountId,
    /// Username of the owning user
    pub owner: String,
    pub balance: Decimal,
    #[sqlx(try_from = "String")]
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// Ledger line (append-only)
///
/// Negative `amount` is a debit, positive is a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One completed funds movement (append-only)
///
/// `amount` is the magnitude; direction comes from the account fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Everything a committed transfer wrote, read inside the same unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

impl fmt::Display for TransferResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {} amount={} {}",
            self.transfer.id,
            self.transfer.from_account_id,
            self.transfer.to_account_id,
            self.transfer.amount,
            self.from_account.currency
        )
    }
}
