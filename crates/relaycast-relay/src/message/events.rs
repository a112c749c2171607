//! Admin-facing wire event definitions.
//!
//! Everything the admin pool receives is one of these events, serialized
//! as an ASCII-safe JSON text frame.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::frame::Frame;

/// Events emitted to the admin pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminEvent {
    /// Connection-count change, emitted on every register and unregister.
    Con {
        /// Unix milliseconds.
        timestamp: i64,
        /// Current broadcast-pool size.
        value: usize,
    },
    /// Echo of a broadcast message, truncated for display.
    Message {
        /// Literal text for short UTF-8 payloads, a length placeholder otherwise.
        value: String,
    },
    /// Periodic aggregate statistics.
    Stats {
        /// Unix milliseconds.
        timestamp: i64,
        /// Messages sent during the tick window.
        messages: u64,
        /// Payload bytes sent during the tick window.
        bytes: u64,
        /// Lifetime messages sent.
        messages_sent: u64,
        /// Lifetime payload bytes sent.
        bytes_sent: u64,
        /// Broadcast-pool size.
        connections: usize,
        /// Admin-pool size.
        admin_connections: usize,
    },
}

impl AdminEvent {
    /// Serialize into the text frame sent on the wire.
    pub fn to_frame(&self) -> Frame {
        Frame::Text(serde_json::to_string(self).unwrap_or_default())
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Admin-facing display form of a broadcast payload.
///
/// Binary payloads and text payloads longer than `max_text_bytes` are
/// replaced by a length placeholder; short text is echoed literally.
pub fn preview(frame: &Frame, max_text_bytes: usize) -> String {
    match frame {
        Frame::Binary(data) => format!("[Binary Message, length: {}]", data.len()),
        Frame::Text(text) if text.len() > max_text_bytes => {
            format!("[UTF8 Message, length: {}]", text.len())
        }
        Frame::Text(text) => text.clone(),
    }
}
