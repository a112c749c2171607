//! Session manager — classifies connections, fans out messages, and feeds
//! the admin pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use relaycast_core::config::relay::RelayConfig;

use crate::connection::handle::{ConnectionHandle, ConnectionId, Lane};
use crate::connection::pool::ConnectionPool;
use crate::message::events::{self, AdminEvent};
use crate::message::frame::Frame;
use crate::metrics::TrafficCounters;
use crate::ticker::StatsTicker;

/// Manages the two connection pools and all fan-out.
///
/// The transport layer calls [`register`](Self::register) when a socket
/// opens, [`handle_message`](Self::handle_message) for every inbound frame,
/// and [`unregister`](Self::unregister) when the socket closes or fails.
/// Failures route through the same path as closes.
#[derive(Debug)]
pub struct RelayManager {
    /// Connection registry, split into broadcast and admin lanes.
    pool: Arc<ConnectionPool>,
    /// Fan-out traffic counters.
    counters: Arc<TrafficCounters>,
    /// Relay configuration.
    config: RelayConfig,
    /// Shutdown signal source for the stats ticker.
    shutdown_tx: broadcast::Sender<()>,
    /// Whether the stats ticker has been armed.
    ticker_armed: AtomicBool,
}

impl RelayManager {
    /// Creates a new relay manager.
    ///
    /// The ticker subscribes to `shutdown_tx` when it is armed, so the
    /// owner of the sender controls when the stats loop stops.
    pub fn new(config: RelayConfig, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            counters: Arc::new(TrafficCounters::new()),
            config,
            shutdown_tx,
            ticker_armed: AtomicBool::new(false),
        }
    }

    /// Registers a new connection, classified by its request path.
    ///
    /// Arms the stats ticker on the first registration, then notifies the
    /// whole admin pool (the new connection included, if it is an admin)
    /// of the updated broadcast-pool size.
    ///
    /// Returns the connection handle and the receiver for outbound frames.
    pub fn register(&self, path: &str) -> (Arc<ConnectionHandle>, mpsc::Receiver<Frame>) {
        self.arm_ticker();

        let lane = Lane::classify(path, &self.config.admin_path);
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(lane, tx));

        self.pool.insert(handle.clone());

        info!(conn_id = %handle.id, lane = ?lane, path, "Connection registered");

        self.notify_admins(&AdminEvent::Con {
            timestamp: events::now_millis(),
            value: self.pool.broadcast_count(),
        });

        (handle, rx)
    }

    /// Unregisters a connection and notifies the admin pool.
    ///
    /// Safe to call for ids that were never registered or were already
    /// removed; the connection-count notification is emitted either way.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            info!(conn_id = %conn_id, "Connection unregistered");
        }

        self.notify_admins(&AdminEvent::Con {
            timestamp: events::now_millis(),
            value: self.pool.broadcast_count(),
        });
    }

    /// Relays one inbound frame.
    ///
    /// The frame goes to every broadcast-pool member (sender included,
    /// unmodified payload and opcode), then a display summary goes to
    /// every admin-pool member. Counters increment once per recipient in
    /// both loops, always with the original payload's byte length. A
    /// failed send never aborts the loop.
    pub fn handle_message(&self, source: &ConnectionId, frame: Frame) {
        let payload_len = frame.len();

        for conn in self.pool.broadcast_connections() {
            self.counters.record_send(payload_len);
            if !conn.send(frame.clone()) {
                warn!(conn_id = %conn.id, "Broadcast send failed");
            }
        }

        let summary = AdminEvent::Message {
            value: events::preview(&frame, self.config.text_preview_max_bytes),
        };
        let summary_frame = summary.to_frame();

        for conn in self.pool.admin_connections() {
            self.counters.record_send(payload_len);
            if !conn.send(summary_frame.clone()) {
                warn!(conn_id = %conn.id, "Admin echo send failed");
            }
        }

        debug!(source = %source, bytes = payload_len, "Frame relayed");
    }

    /// Current broadcast-pool size.
    pub fn broadcast_count(&self) -> usize {
        self.pool.broadcast_count()
    }

    /// Current admin-pool size.
    pub fn admin_count(&self) -> usize {
        self.pool.admin_count()
    }

    /// Whether the stats ticker has been armed.
    pub fn ticker_armed(&self) -> bool {
        self.ticker_armed.load(Ordering::SeqCst)
    }

    /// Returns a reference to the traffic counters.
    pub fn counters(&self) -> &Arc<TrafficCounters> {
        &self.counters
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Marks every connection dead and clears both pools.
    pub fn close_all(&self) {
        for conn in self.pool.broadcast_connections() {
            conn.mark_dead();
            self.pool.remove(&conn.id);
        }
        for conn in self.pool.admin_connections() {
            conn.mark_dead();
            self.pool.remove(&conn.id);
        }
        info!("All connections closed");
    }

    /// Arms the stats ticker exactly once, on the first registration.
    fn arm_ticker(&self) {
        if self.ticker_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let ticker = StatsTicker::new(
            self.pool.clone(),
            self.counters.clone(),
            Duration::from_millis(self.config.tick_interval_ms),
        );
        tokio::spawn(ticker.run(self.shutdown_tx.subscribe()));

        info!(
            interval_ms = self.config.tick_interval_ms,
            "Stats ticker armed"
        );
    }

    /// Sends an event to every admin-pool member.
    fn notify_admins(&self, event: &AdminEvent) {
        let frame = event.to_frame();
        for conn in self.pool.admin_connections() {
            if !conn.send(frame.clone()) {
                warn!(conn_id = %conn.id, "Admin notification send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::Receiver;

    fn make_manager() -> RelayManager {
        let (shutdown_tx, _) = broadcast::channel(1);
        RelayManager::new(RelayConfig::default(), shutdown_tx)
    }

    fn next_event(rx: &mut Receiver<Frame>) -> AdminEvent {
        let frame = rx.try_recv().expect("expected a queued admin frame");
        serde_json::from_str(frame.as_text().expect("admin frames are text"))
            .expect("admin frames are valid events")
    }

    #[tokio::test]
    async fn test_classification_by_path() {
        let manager = make_manager();
        let (client, _rx_client) = manager.register("/");
        let (admin, _rx_admin) = manager.register("/admin");

        assert_eq!(client.lane, Lane::Broadcast);
        assert_eq!(admin.lane, Lane::Admin);
        assert_eq!(manager.broadcast_count(), 1);
        assert_eq!(manager.admin_count(), 1);
    }

    #[tokio::test]
    async fn test_pool_sizes_track_opens_and_closes() {
        let manager = make_manager();
        let (a, _rx_a) = manager.register("/chat");
        let (b, _rx_b) = manager.register("/feed");
        let (m, _rx_m) = manager.register("/admin");

        assert_eq!(manager.broadcast_count() + manager.admin_count(), 3);

        manager.unregister(&a.id);
        manager.unregister(&b.id);
        manager.unregister(&m.id);

        assert_eq!(manager.broadcast_count(), 0);
        assert_eq!(manager.admin_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_sees_con_events_including_its_own() {
        let manager = make_manager();
        let (_admin, mut rx_admin) = manager.register("/admin");

        // the admin's own registration is announced to the whole pool
        match next_event(&mut rx_admin) {
            AdminEvent::Con { value, .. } => assert_eq!(value, 0),
            other => panic!("expected con event, got {other:?}"),
        }

        let (client, _rx_client) = manager.register("/");
        match next_event(&mut rx_admin) {
            AdminEvent::Con { value, .. } => assert_eq!(value, 1),
            other => panic!("expected con event, got {other:?}"),
        }

        manager.unregister(&client.id);
        match next_event(&mut rx_admin) {
            AdminEvent::Con { value, .. } => assert_eq!(value, 0),
            other => panic!("expected con event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fanout_includes_sender_and_echoes_to_admin() {
        let manager = make_manager();
        let (a, mut rx_a) = manager.register("/");
        let (_b, mut rx_b) = manager.register("/");
        let (_m, mut rx_m) = manager.register("/admin");

        // drop the con event queued during admin registration
        let _ = next_event(&mut rx_m);

        manager.handle_message(&a.id, Frame::text("hi"));

        assert_eq!(rx_a.try_recv().unwrap(), Frame::text("hi"));
        assert_eq!(rx_b.try_recv().unwrap(), Frame::text("hi"));
        assert_eq!(
            next_event(&mut rx_m),
            AdminEvent::Message {
                value: "hi".to_string()
            }
        );

        // 2 broadcast sends + 1 admin echo, each weighted by the 2-byte payload
        assert_eq!(manager.counters().messages_since_tick(), 3);
        assert_eq!(manager.counters().bytes_since_tick(), 6);
    }

    #[tokio::test]
    async fn test_binary_fanout_preserves_opcode() {
        let manager = make_manager();
        let (a, mut rx_a) = manager.register("/");
        let (_m, mut rx_m) = manager.register("/admin");
        let _ = next_event(&mut rx_m);

        let payload = Frame::binary(vec![1u8, 2, 3, 4]);
        manager.handle_message(&a.id, payload.clone());

        assert_eq!(rx_a.try_recv().unwrap(), payload);
        assert_eq!(
            next_event(&mut rx_m),
            AdminEvent::Message {
                value: "[Binary Message, length: 4]".to_string()
            }
        );
        assert_eq!(manager.counters().bytes_since_tick(), 8);
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_abort_fanout() {
        let manager = make_manager();
        let (a, mut rx_a) = manager.register("/");
        let (_dead, rx_dead) = manager.register("/");
        drop(rx_dead);

        manager.handle_message(&a.id, Frame::text("hi"));

        assert_eq!(rx_a.try_recv().unwrap(), Frame::text("hi"));
        // the dead recipient still counted toward outbound load
        assert_eq!(manager.counters().messages_since_tick(), 2);
    }

    #[tokio::test]
    async fn test_unregister_unknown_id_is_noop() {
        let manager = make_manager();
        let (_a, _rx_a) = manager.register("/");

        manager.unregister(&ConnectionId::new_v4());
        assert_eq!(manager.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn test_ticker_arms_on_first_registration_only() {
        let manager = make_manager();
        assert!(!manager.ticker_armed());

        let (_a, _rx_a) = manager.register("/");
        assert!(manager.ticker_armed());
    }
}
