//! HTTP handlers
//!
//! Handlers only translate: request DTO to `TransferCommand`, result or
//! `TransferError` back to `ApiResponse`. No business rule lives here.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::AuthenticatedUser;
use super::state::AppState;
use super::types::{ApiError, ApiResponse, HealthResponse, TransferApiRequest, error_codes};
use crate::ledger::{
    Account, AccountId, AccountReader, LedgerStore, TransferCommand, TransferResult,
};

/// Create a transfer
///
/// POST /api/v1/transfers
pub async fn create_transfer<S>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<TransferApiRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TransferResult>>, ApiError>
where
    S: AccountReader + LedgerStore + Clone + 'static,
{
    let Json(req) = payload.map_err(|e| ApiError::invalid_parameter(e.body_text()))?;
    req.check_ids()?;

    let cmd = TransferCommand {
        from_account_id: req.from_account_id,
        to_account_id: req.to_account_id,
        amount: req.amount,
        requesting_username: user.username,
    };

    let result = state.transfer_service.transfer(cmd).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Get one account (owner only)
///
/// GET /api/v1/accounts/{id}
pub async fn get_account<S>(
    State(state): State<Arc<AppState<S>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<AccountId>,
) -> Result<Json<ApiResponse<Account>>, ApiError>
where
    S: AccountReader + LedgerStore + Clone + 'static,
{
    if id < 1 {
        return Err(ApiError::invalid_parameter("account id must be >= 1"));
    }
    let account = state.transfer_service.account(id, &user.username).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// Health check
///
/// GET /api/v1/health
/// - Healthy: 200 + {code: 0, data: {version, timestamp_ms}}
/// - Unhealthy: 503 + {code: 5001, msg: "unavailable"}
pub async fn health_check<S>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError>
where
    S: Send + Sync + 'static,
{
    if let Some(db) = &state.pg_db {
        if let Err(e) = db.health_check().await {
            tracing::error!(error = %e, "[HEALTH] PostgreSQL ping failed");
            return Err(ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
                "unavailable",
            ));
        }
    }

    Ok(Json(ApiResponse::success(HealthResponse {
        version: env!("GIT_HASH").to_string(),
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
    })))
}
