//! WebSocket Handler
//!
//! Per-connection signaling loop.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use room_protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::metrics::ServerMetrics;
use crate::registry::{JoinOutcome, Outbound, RegistryHandle, TransportId};

/// Handle a signaling WebSocket connection until either side closes it.
pub async fn handle_signaling_ws(
    socket: WebSocket,
    registry: RegistryHandle,
    metrics: Arc<ServerMetrics>,
) {
    let transport = TransportId::new();
    info!(conn = %transport, "Signaling connection opened");
    metrics.connection_opened();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // The registry holds a clone of `tx` while this connection is a member.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let sender_task = async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.encode() {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    };

    let registry_input = registry.clone();
    let metrics_input = metrics.clone();
    let input_task = async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics_input.message_received();
                    handle_frame(&text, transport, &registry_input, &tx, &metrics_input).await;
                }
                Ok(Message::Binary(_)) => {
                    debug!(conn = %transport, "Binary frames are not part of the protocol");
                }
                Ok(Message::Close(_)) => {
                    debug!(conn = %transport, "Client closed connection");
                    break;
                }
                Err(e) => {
                    warn!(conn = %transport, "WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = sender_task => debug!(conn = %transport, "Sender task ended"),
        _ = input_task => debug!(conn = %transport, "Input task ended"),
    }

    // A vanished transport leaves through the same path as an explicit leave.
    if let Err(e) = registry.leave(transport).await {
        warn!(conn = %transport, "Failed to deregister on disconnect: {}", e);
    }

    metrics.connection_closed();
    info!(conn = %transport, "Signaling connection closed");
}

async fn handle_frame(
    text: &str,
    transport: TransportId,
    registry: &RegistryHandle,
    tx: &Outbound,
    metrics: &ServerMetrics,
) {
    let client_msg = match ClientMessage::decode(text) {
        Ok(m) => m,
        Err(e) => {
            metrics.invalid_message();
            warn!(conn = %transport, "Rejected client frame: {}", e);
            let _ = tx.send(ServerMessage::Error {
                message: e.to_string(),
            });
            return;
        }
    };

    match client_msg {
        ClientMessage::JoinRoom { room_id, peer_id } => {
            match registry.join(room_id, transport, peer_id, tx.clone()).await {
                Ok(JoinOutcome::Joined { .. }) => {}
                Ok(JoinOutcome::AlreadyJoined { room_id }) => {
                    debug!(conn = %transport, room = %room_id, "Already a member");
                }
                Err(e) => error!(conn = %transport, "Join failed: {}", e),
            }
        }
        ClientMessage::LeaveRoom => {
            if let Err(e) = registry.leave(transport).await {
                error!(conn = %transport, "Leave failed: {}", e);
            }
        }
    }
}
