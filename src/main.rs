//! Banking Ledger gateway
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌───────────┐    ┌──────────┐
//! │  Config  │───▶│ Gateway  │───▶│ Validator │───▶│ Executor │───▶ PostgreSQL
//! │  (YAML)  │    │  (axum)  │    │ (reads)   │    │ (one tx) │
//! └──────────┘    └──────────┘    └───────────┘    └──────────┘
//! ```
//!
//! Usage: `banking_ledger [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;

use banking_ledger::config::AppConfig;
use banking_ledger::db::Database;
use banking_ledger::gateway::{self, state::AppState};
use banking_ledger::ledger::{PgLedger, TransferService};
use banking_ledger::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = init_logging(&app_config);

    tracing::info!(env = %env, version = env!("GIT_HASH"), "Starting banking ledger");

    let db = Database::connect(&app_config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.health_check()
        .await
        .context("PostgreSQL health check failed")?;

    if app_config.database.auto_migrate {
        db.init_schema().await?;
    }

    let ledger = PgLedger::new(db.pool().clone());
    let mut service = TransferService::new(ledger);
    if let Some(timeout) = app_config.ledger.execution_timeout() {
        tracing::info!(
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Transfer execution timeout enabled"
        );
        service = service.with_execution_timeout(timeout);
    }

    let state = Arc::new(AppState::new(service, Some(Arc::new(db))));
    gateway::run_server(&app_config.gateway, state).await
}
