//! WebSocket relay endpoint.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{OriginalUri, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use relaycast_relay::message::frame::Frame;

use crate::handlers::status;
use crate::state::AppState;

/// Relay endpoint mounted on every path.
///
/// WebSocket upgrades are classified by their request path (the configured
/// admin path selects the admin pool, anything else the broadcast pool).
/// Plain HTTP requests fall through to the status page.
pub async fn relay_endpoint(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => {
            let path = uri.path().to_string();
            ws.on_upgrade(move |socket| handle_socket(state, path, socket))
                .into_response()
        }
        Err(_) => status::status_page(&state).into_response(),
    }
}

/// Drives an established WebSocket connection.
async fn handle_socket(state: AppState, path: String, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Register the connection, classified by its request path
    let (handle, mut outbound_rx) = state.engine.manager.register(&path);
    let conn_id = handle.id;

    info!(conn_id = %conn_id, path = %path, "WebSocket connection established");

    // Spawn outbound frame forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                Frame::Text(text) => Message::Text(text.into()),
                Frame::Binary(data) => Message::Binary(data.into()),
            };
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    // Process inbound messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state
                    .engine
                    .manager
                    .handle_message(&conn_id, Frame::text(text.as_str()));
            }
            Ok(Message::Binary(data)) => {
                state
                    .engine
                    .manager
                    .handle_message(&conn_id, Frame::binary(data.to_vec()));
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Cleanup: transport failures take the same path as closes
    outbound_task.abort();
    state.engine.manager.unregister(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
