use std::sync::Arc;

use hearth_intake::IntakeOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, absent when the intake runs on in-memory stores.
    pub pool: Option<hearth_db::DbPool>,
    pub config: Arc<ServerConfig>,
    pub intake: IntakeOrchestrator,
}
