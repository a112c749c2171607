//! Periodic statistics tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, warn};

use crate::connection::pool::ConnectionPool;
use crate::message::events::{self, AdminEvent};
use crate::metrics::TrafficCounters;

/// Periodic statistics emitter.
///
/// Armed once, on the first registration, and re-armed from completion:
/// each cycle sleeps the full interval after the previous tick finishes,
/// so slow processing accumulates drift instead of bunching ticks. Stats
/// are emitted unconditionally every tick, active window or not.
#[derive(Debug)]
pub struct StatsTicker {
    /// Connection registry, for pool sizes and admin delivery.
    pool: Arc<ConnectionPool>,
    /// Counters folded at every tick.
    counters: Arc<TrafficCounters>,
    /// Tick interval.
    interval: Duration,
}

impl StatsTicker {
    /// Creates a ticker over the shared pool and counters.
    pub fn new(
        pool: Arc<ConnectionPool>,
        counters: Arc<TrafficCounters>,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            counters,
            interval,
        }
    }

    /// Runs until the shutdown signal fires (or its sender is dropped).
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        debug!(armed_at = events::now_millis(), "Stats ticker running");

        loop {
            tokio::select! {
                _ = time::sleep(self.interval) => self.tick(),
                _ = shutdown.recv() => break,
            }
        }

        debug!("Stats ticker stopped");
    }

    /// Folds the counters and emits one stats event to the admin pool.
    pub fn tick(&self) {
        let snapshot = self.counters.fold_tick();

        let event = AdminEvent::Stats {
            timestamp: events::now_millis(),
            messages: snapshot.messages,
            bytes: snapshot.bytes,
            messages_sent: snapshot.messages_sent,
            bytes_sent: snapshot.bytes_sent,
            connections: self.pool.broadcast_count(),
            admin_connections: self.pool.admin_count(),
        };

        let frame = event.to_frame();
        for conn in self.pool.admin_connections() {
            if !conn.send(frame.clone()) {
                warn!(conn_id = %conn.id, "Stats send failed");
            }
        }
    }
}
