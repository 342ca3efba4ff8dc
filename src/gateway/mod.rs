pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::{Next, from_fn},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::ledger::{AccountReader, LedgerStore};
use state::AppState;
use types::{ApiResponse, error_codes};

/// Header set by the trusted upstream authentication layer
pub const AUTH_USER_HEADER: &str = "x-authenticated-user";

/// Requester identity injected by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Turn the upstream identity header into an `AuthenticatedUser` extension.
async fn auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    let username = request
        .headers()
        .get(AUTH_USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::MISSING_AUTH,
                "Missing authenticated user",
            )),
        ))?
        .to_string();

    request
        .extensions_mut()
        .insert(AuthenticatedUser { username });
    Ok(next.run(request).await)
}

/// Build the gateway router over any ledger store
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: AccountReader + LedgerStore + Clone + 'static,
{
    let private_routes = Router::new()
        .route("/transfers", post(handlers::create_transfer::<S>))
        .route("/accounts/{id}", get(handlers::get_account::<S>))
        .layer(from_fn(auth_middleware));

    let api = Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .merge(private_routes);

    Router::new().nest("/api/v1", api).with_state(state)
}

/// Start HTTP Gateway server
pub async fn run_server<S>(config: &GatewayConfig, state: Arc<AppState<S>>) -> anyhow::Result<()>
where
    S: AccountReader + LedgerStore + Clone + 'static,
{
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
