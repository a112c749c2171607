//! Fan-out traffic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Fan-out-weighted traffic counters.
///
/// Every counter increments once per recipient sent-to, so the totals
/// reflect outbound load (which scales with fan-out breadth) rather than
/// inbound message rate.
#[derive(Debug, Default)]
pub struct TrafficCounters {
    /// Messages sent since the last stats tick
    messages_since_tick: AtomicU64,
    /// Payload bytes sent since the last stats tick
    bytes_since_tick: AtomicU64,
    /// Messages sent over the process lifetime
    lifetime_messages: AtomicU64,
    /// Payload bytes sent over the process lifetime
    lifetime_bytes: AtomicU64,
}

impl TrafficCounters {
    /// Create new zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outbound send carrying `bytes` payload bytes.
    pub fn record_send(&self, bytes: usize) {
        self.messages_since_tick.fetch_add(1, Ordering::Relaxed);
        self.bytes_since_tick
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Snapshot and reset the since-tick counters, folding them into the
    /// lifetime totals. Called exactly once per stats tick.
    pub fn fold_tick(&self) -> TickSnapshot {
        let messages = self.messages_since_tick.swap(0, Ordering::Relaxed);
        let bytes = self.bytes_since_tick.swap(0, Ordering::Relaxed);
        let messages_sent = self
            .lifetime_messages
            .fetch_add(messages, Ordering::Relaxed)
            + messages;
        let bytes_sent = self.lifetime_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;

        TickSnapshot {
            messages,
            bytes,
            messages_sent,
            bytes_sent,
        }
    }

    /// Messages sent since the last tick.
    pub fn messages_since_tick(&self) -> u64 {
        self.messages_since_tick.load(Ordering::Relaxed)
    }

    /// Payload bytes sent since the last tick.
    pub fn bytes_since_tick(&self) -> u64 {
        self.bytes_since_tick.load(Ordering::Relaxed)
    }

    /// Lifetime messages sent (folded in at tick boundaries).
    pub fn lifetime_messages(&self) -> u64 {
        self.lifetime_messages.load(Ordering::Relaxed)
    }

    /// Lifetime payload bytes sent (folded in at tick boundaries).
    pub fn lifetime_bytes(&self) -> u64 {
        self.lifetime_bytes.load(Ordering::Relaxed)
    }
}

/// Serializable snapshot produced by one stats tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Messages sent during the tick window
    pub messages: u64,
    /// Payload bytes sent during the tick window
    pub bytes: u64,
    /// Lifetime messages sent, including this window
    pub messages_sent: u64,
    /// Lifetime payload bytes sent, including this window
    pub bytes_sent: u64,
}
