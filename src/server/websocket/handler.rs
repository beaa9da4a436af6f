//! WebSocket route handler.
//!
//! Handles WebSocket upgrade, message loop, and cleanup.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::server::metrics::{connection_closed, connection_opened};
use crate::server::state::{GuardedDispatcher, ServerState};

const TRANSPORT: &str = "websocket";

/// WebSocket upgrade handler for `GET /mcp`. A plain GET without upgrade
/// headers is not a valid way to talk MCP and gets 405.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<ServerState>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            debug!("Rejecting non-upgrade GET /mcp: {}", rejection);
            return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n").into_response();
        }
    };
    let connection_id = Uuid::new_v4();
    debug!("WebSocket upgrade for connection {}", connection_id);

    let dispatcher = state.dispatcher.clone();
    let cancel = state.shutdown.child_token();
    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, dispatcher, cancel))
}

/// Handle an established WebSocket connection.
async fn handle_socket(
    socket: WebSocket,
    connection_id: Uuid,
    dispatcher: GuardedDispatcher,
    cancel: CancellationToken,
) {
    info!("WebSocket connected: {}", connection_id);
    connection_opened(TRANSPORT);

    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Closing WebSocket {} on shutdown", connection_id);
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }
            frame = ws_stream.next() => frame,
        };

        let raw = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(_))) => {
                debug!("Received binary message, ignoring");
                continue;
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                // Axum/tungstenite handles pong automatically
                continue;
            }
            Some(Ok(Message::Close(_))) | None => {
                debug!("Received close frame");
                break;
            }
            Some(Err(e)) => {
                warn!("WebSocket error on {}: {}", connection_id, e);
                break;
            }
        };

        if let Some(reply) = dispatcher.handle(raw.as_str().as_bytes(), &cancel).await {
            let text = String::from_utf8_lossy(&reply).into_owned();
            if ws_sink.send(Message::Text(text.into())).await.is_err() {
                debug!("Failed to write reply on {}, closing", connection_id);
                break;
            }
        }
    }

    cancel.cancel();
    connection_closed(TRANSPORT);
    info!("WebSocket disconnected: {}", connection_id);
}
