//! Top-level relay engine facade.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use relaycast_core::config::relay::RelayConfig;

use crate::manager::RelayManager;

/// Central engine that owns the session manager and the shutdown signal.
#[derive(Debug, Clone)]
pub struct RelayEngine {
    /// Session manager.
    pub manager: Arc<RelayManager>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayEngine {
    /// Creates a new relay engine.
    pub fn new(config: RelayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let manager = Arc::new(RelayManager::new(config, shutdown_tx.clone()));

        info!("Relay engine initialized");

        Self {
            manager,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: stops the stats ticker and closes
    /// all connections.
    pub fn shutdown(&self) {
        info!("Shutting down relay engine");

        let _ = self.shutdown_tx.send(());
        self.manager.close_all();
    }
}
