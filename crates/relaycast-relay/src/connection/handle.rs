//! Individual relay connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message::frame::Frame;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// The pool a connection belongs to, decided once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    /// Ordinary client: receives every broadcast message.
    Broadcast,
    /// Privileged observer: receives connection events, message echoes,
    /// and periodic statistics.
    Admin,
}

impl Lane {
    /// Classify a request path into a lane.
    ///
    /// Only an exact match on the admin path selects the admin lane; every
    /// other path (including `/`) is an ordinary broadcast client.
    pub fn classify(path: &str, admin_path: &str) -> Self {
        if path == admin_path {
            Self::Admin
        } else {
            Self::Broadcast
        }
    }

    /// Whether this is the admin lane.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// A handle to a single relay connection.
///
/// Holds the sender half of the connection's outbound frame queue plus the
/// lane it was classified into. The transport layer owns the socket; the
/// relay core only ever sees this handle.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Pool this connection was classified into
    pub lane: Lane,
    /// Sender for outbound frames
    pub sender: mpsc::Sender<Frame>,
    /// When the connection was registered
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(lane: Lane, sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lane,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue a frame for delivery to this connection.
    ///
    /// Best-effort and non-blocking: a full outbound buffer drops the
    /// frame, a closed buffer marks the handle dead. Returns whether the
    /// frame was accepted.
    pub fn send(&self, frame: Frame) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Connection {} send buffer full, dropping frame", self.id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exact_match_only() {
        assert_eq!(Lane::classify("/admin", "/admin"), Lane::Admin);
        assert_eq!(Lane::classify("/", "/admin"), Lane::Broadcast);
        assert_eq!(Lane::classify("", "/admin"), Lane::Broadcast);
        assert_eq!(Lane::classify("/admin/", "/admin"), Lane::Broadcast);
        assert_eq!(Lane::classify("/chat", "/admin"), Lane::Broadcast);
    }

    #[tokio::test]
    async fn test_send_delivers_frame() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Lane::Broadcast, tx);

        assert!(handle.send(Frame::text("hi")));
        assert_eq!(rx.recv().await, Some(Frame::text("hi")));
    }

    #[tokio::test]
    async fn test_send_to_closed_receiver_marks_dead() {
        let (tx, rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(Lane::Broadcast, tx);
        drop(rx);

        assert!(!handle.send(Frame::text("hi")));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_send_to_full_buffer_drops_frame() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(Lane::Broadcast, tx);

        assert!(handle.send(Frame::text("first")));
        assert!(!handle.send(Frame::text("second")));
        // full buffer drops the frame but keeps the connection
        assert!(handle.is_alive());
    }
}
