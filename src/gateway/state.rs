use std::sync::Arc;

use crate::db::Database;
use crate::ledger::TransferService;

/// Gateway application state
pub struct AppState<S> {
    pub transfer_service: TransferService<S>,
    /// Pinged by the health endpoint; `None` for in-process stores
    pub pg_db: Option<Arc<Database>>,
}

impl<S> AppState<S> {
    pub fn new(transfer_service: TransferService<S>, pg_db: Option<Arc<Database>>) -> Self {
        Self {
            transfer_service,
            pg_db,
        }
    }
}
