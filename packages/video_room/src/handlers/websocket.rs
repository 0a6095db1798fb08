use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

use crate::AppState;
use crate::ws;

/// Signaling WebSocket - one connection per room client
pub async fn signaling_websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let registry = state.registry.clone();
    let metrics = state.metrics.clone();

    ws.on_upgrade(move |socket| ws::handle_signaling_ws(socket, registry, metrics))
}
