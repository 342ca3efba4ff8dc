//! API request/response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: error response with HTTP status
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::ledger::{AccountId, TransferError};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error response: HTTP status plus `{code, msg}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, error_codes::for_transfer_error(e), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// `POST /api/v1/transfers` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferApiRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    /// Decimal string, e.g. `"100.50"`
    pub amount: String,
}

impl TransferApiRequest {
    /// Reject ids that can never name a row
    pub fn check_ids(&self) -> Result<(), ApiError> {
        if self.from_account_id < 1 {
            return Err(ApiError::invalid_parameter("from_account_id must be >= 1"));
        }
        if self.to_account_id < 1 {
            return Err(ApiError::invalid_parameter("to_account_id must be >= 1"));
        }
        Ok(())
    }
}

/// Health check response data
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    /// Server timestamp in milliseconds
    pub timestamp_ms: i64,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    use crate::ledger::TransferError;

    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const NEGATIVE_AMOUNT: i32 = 1004;
    pub const CURRENCY_MISMATCH: i32 = 1005;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const INVALID_OWNER: i32 = 2003;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;

    pub fn for_transfer_error(e: TransferError) -> i32 {
        match e {
            TransferError::InvalidAmount => INVALID_AMOUNT,
            TransferError::NegativeAmount => NEGATIVE_AMOUNT,
            TransferError::InvalidOwner => INVALID_OWNER,
            TransferError::InsufficientBalance => INSUFFICIENT_BALANCE,
            TransferError::CurrencyMismatch => CURRENCY_MISMATCH,
            TransferError::AccountNotFound => ACCOUNT_NOT_FOUND,
            TransferError::Internal => INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (TransferError::InvalidAmount, StatusCode::BAD_REQUEST, 1003),
            (TransferError::InvalidOwner, StatusCode::FORBIDDEN, 2003),
            (
                TransferError::InsufficientBalance,
                StatusCode::UNPROCESSABLE_ENTITY,
                1002,
            ),
            (TransferError::AccountNotFound, StatusCode::NOT_FOUND, 4001),
            (
                TransferError::Internal,
                StatusCode::INTERNAL_SERVER_ERROR,
                5000,
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status, "{:?}", err);
            assert_eq!(api.code, code, "{:?}", err);
        }
    }

    #[test]
    fn test_internal_message_is_generic() {
        let api = ApiError::from(TransferError::Internal);
        assert_eq!(api.msg, "Internal error");
    }

    #[test]
    fn test_check_ids() {
        let mut req = TransferApiRequest {
            from_account_id: 1,
            to_account_id: 2,
            amount: "1".to_string(),
        };
        assert!(req.check_ids().is_ok());

        req.to_account_id = 0;
        let err = req.check_ids().unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMETER);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_body_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error(4001, "Account not found")).unwrap();
        assert_eq!(body["code"], 4001);
        assert!(body.get("data").is_none());
    }
}
