//! Plain-HTTP status fallback and health check.

use axum::Json;
use axum::response::Html;
use serde::Serialize;

use crate::state::AppState;

/// Body of the `GET /api/health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Renders the status page a non-WebSocket observer receives on any relay
/// path: the current broadcast-pool size. No state mutation.
pub fn status_page(state: &AppState) -> Html<String> {
    Html(format!(
        "<html><body><p>{} current connections.</p></body></html>",
        state.engine.manager.broadcast_count()
    ))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
