//! Transfer Error Types
//!
//! Closed set of outcomes the boundary layer maps to client-facing signals.
//! Storage detail never travels inside an error value; it is logged where
//! the storage error is converted.

use thiserror::Error;

use crate::db::schema::BALANCE_CHECK_CONSTRAINT;

/// Transfer error kinds
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferError {
    /// Amount string is not a decimal literal
    #[error("Amount is not a valid decimal")]
    InvalidAmount,

    /// Amount parsed but is zero or negative
    #[error("Amount must be greater than zero")]
    NegativeAmount,

    /// Requester does not own the source account
    #[error("Source account does not belong to the authenticated user")]
    InvalidOwner,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Source and destination currencies differ")]
    CurrencyMismatch,

    #[error("Account not found")]
    AccountNotFound,

    /// Opaque catch-all (storage, commit, decode, timeout)
    #[error("Internal error")]
    Internal,
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::NegativeAmount => "NEGATIVE_AMOUNT",
            TransferError::InvalidOwner => "INVALID_OWNER",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::CurrencyMismatch => "CURRENCY_MISMATCH",
            TransferError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            TransferError::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount
            | TransferError::NegativeAmount
            | TransferError::CurrencyMismatch => 400,
            TransferError::InvalidOwner => 403,
            TransferError::AccountNotFound => 404,
            TransferError::InsufficientBalance => 422,
            TransferError::Internal => 500,
        }
    }

    /// Expected, caller-actionable outcome (everything except `Internal`)
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TransferError::Internal)
    }
}

/// PostgreSQL SQLSTATE codes the ledger schema can raise
mod sqlstate {
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        if matches!(e, sqlx::Error::RowNotFound) {
            return TransferError::AccountNotFound;
        }

        let db = e.as_database_error();
        let code = db.and_then(|db| db.code());
        let constraint = db.and_then(|db| db.constraint());

        let kind = classify_database_error(code.as_deref(), constraint);
        if kind == TransferError::Internal {
            tracing::error!(error = %e, "Ledger storage failure");
        }
        kind
    }
}

/// Map a SQLSTATE plus violated constraint onto the error taxonomy
///
/// Only the balance check means insufficient funds; any other check
/// violation is an integrity bug and stays opaque.
fn classify_database_error(code: Option<&str>, constraint: Option<&str>) -> TransferError {
    match code {
        Some(sqlstate::FOREIGN_KEY_VIOLATION) => TransferError::AccountNotFound,
        Some(sqlstate::CHECK_VIOLATION) if constraint == Some(BALANCE_CHECK_CONSTRAINT) => {
            TransferError::InsufficientBalance
        }
        _ => TransferError::Internal,
    }
}
