//! # relaycast-api
//!
//! HTTP/WebSocket surface for Relaycast: the axum router, the WebSocket
//! relay endpoint, and the plain-HTTP status fallback.

pub mod handlers;
pub mod router;
pub mod state;
