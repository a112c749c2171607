//! Relay engine configuration.

use serde::{Deserialize, Serialize};

/// Relay engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Statistics tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Per-connection outbound channel buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Resource path that classifies a connection into the admin pool.
    #[serde(default = "default_admin_path")]
    pub admin_path: String,
    /// Maximum byte length of a text payload echoed literally to admins.
    /// Longer payloads are summarized as a length placeholder.
    #[serde(default = "default_text_preview")]
    pub text_preview_max_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            channel_buffer_size: default_channel_buffer(),
            admin_path: default_admin_path(),
            text_preview_max_bytes: default_text_preview(),
        }
    }
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_channel_buffer() -> usize {
    256
}

fn default_admin_path() -> String {
    "/admin".to_string()
}

fn default_text_preview() -> usize {
    126
}
