use std::sync::Arc;

use mxvault_db::DbPool;
use mxvault_engine::VersionManager;
use mxvault_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    pub manager: Arc<VersionManager>,
    pub event_bus: Arc<EventBus>,
}
