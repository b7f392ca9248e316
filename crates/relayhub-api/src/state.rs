//! Application state shared across all handlers.

use std::sync::Arc;

use relayhub_core::config::AppConfig;
use relayhub_realtime::RelayHub;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Relay engine
    pub hub: RelayHub,
}

impl AppState {
    /// Creates the state from loaded configuration and a running hub.
    pub fn new(config: AppConfig, hub: RelayHub) -> Self {
        Self {
            config: Arc::new(config),
            hub,
        }
    }
}
