//! Application state shared across all handlers.

use std::sync::Arc;

use relaycast_core::config::AppConfig;
use relaycast_relay::RelayEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Relay engine
    pub engine: Arc<RelayEngine>,
}
