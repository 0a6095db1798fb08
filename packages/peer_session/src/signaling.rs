//! WebSocket client for the room server's signaling channel.

use futures::{SinkExt, StreamExt};
use room_protocol::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tracing::{debug, error, warn};

use crate::error::SignalingError;

/// A live signaling connection.
///
/// A background task owns the socket: it writes queued [`ClientMessage`]s
/// and decodes incoming frames into [`ServerMessage`]s. When the socket
/// ends, [`SignalingClient::recv`] returns `None`.
pub struct SignalingClient {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    task: JoinHandle<()>,
}

impl SignalingClient {
    pub async fn connect(url: &str) -> Result<Self, SignalingError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (mut ws_write, mut ws_read) = ws_stream.split();
        debug!(url, "Signaling connected");

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerMessage>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = outbound_rx.recv() => match msg {
                        Some(msg) => {
                            let json = match msg.encode() {
                                Ok(j) => j,
                                Err(e) => {
                                    error!("Failed to serialize message: {}", e);
                                    continue;
                                }
                            };
                            if ws_write.send(tungstenite::Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = ws_write.send(tungstenite::Message::Close(None)).await;
                            break;
                        }
                    },
                    frame = ws_read.next() => match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match ServerMessage::decode(&text) {
                                Ok(msg) => {
                                    if inbound_tx.send(msg).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!("Ignoring malformed signaling frame: {}", e),
                            }
                        }
                        Some(Ok(tungstenite::Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("Signaling connection error: {}", e);
                            break;
                        }
                    },
                }
            }
            debug!("Signaling task ended");
        });

        Ok(Self {
            outbound,
            inbound,
            task,
        })
    }

    pub fn send(&self, message: ClientMessage) -> Result<(), SignalingError> {
        self.outbound
            .send(message)
            .map_err(|_| SignalingError::Closed)
    }

    /// Next server event, or `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.inbound.recv().await
    }

    /// Flush queued messages, close the socket and wait for the task to end.
    pub async fn close(self) {
        let Self { outbound, task, .. } = self;
        drop(outbound);
        let _ = task.await;
    }
}
