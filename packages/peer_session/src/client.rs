use room_protocol::{ClientMessage, RoomId, ServerMessage};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::display::VideoGrid;
use crate::error::SessionError;
use crate::manager::SessionManager;
use crate::media::{IncomingCall, MediaConstraints, MediaDevices, MediaEndpoint, OpenEndpoint};
use crate::session::{SessionConfig, SessionReport};
use crate::signaling::SignalingClient;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full WebSocket URL of the signaling channel, e.g. `ws://host:3000/ws`.
    pub signaling_url: String,
    pub room_id: RoomId,
    pub constraints: MediaConstraints,
    pub session: SessionConfig,
}

impl ClientConfig {
    pub fn new(signaling_url: impl Into<String>, room_id: RoomId) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            room_id,
            constraints: MediaConstraints::default(),
            session: SessionConfig::default(),
        }
    }
}

/// One participant's membership in a room, from media capture to teardown.
pub struct RoomClient<D, E, G> {
    devices: D,
    endpoint: E,
    grid: Arc<G>,
    config: ClientConfig,
}

enum Step {
    Signal(Option<ServerMessage>),
    Incoming(IncomingCall),
    Report(SessionReport),
    Leave,
}

impl<D, E, G> RoomClient<D, E, G>
where
    D: MediaDevices,
    E: MediaEndpoint,
    G: VideoGrid,
{
    pub fn new(devices: D, endpoint: E, grid: Arc<G>, config: ClientConfig) -> Self {
        Self {
            devices,
            endpoint,
            grid,
            config,
        }
    }

    /// Join the room and stay until `leave` is cancelled or the signaling
    /// channel closes. Every session is closed before this returns.
    ///
    /// Local media is captured first. If that fails nothing else happens:
    /// no signaling connection is made and the room is never joined.
    pub async fn run(self, leave: CancellationToken) -> Result<(), SessionError> {
        let Self {
            devices,
            mut endpoint,
            grid,
            config,
        } = self;

        let local = match devices.acquire(config.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(room = %config.room_id, "Not joining, local media unavailable: {}", e);
                return Err(e.into());
            }
        };
        grid.show_local(&local);

        let mut signaling = SignalingClient::connect(&config.signaling_url).await?;
        let OpenEndpoint {
            peer_id,
            mut incoming,
        } = endpoint.open().await?;

        signaling.send(ClientMessage::JoinRoom {
            room_id: config.room_id.clone(),
            peer_id: peer_id.clone(),
        })?;
        info!(room = %config.room_id, peer = %peer_id, "Joined room");

        let mut manager = SessionManager::new(endpoint, grid, local, config.session);
        let mut incoming_open = true;

        loop {
            let step = tokio::select! {
                _ = leave.cancelled() => Step::Leave,
                msg = signaling.recv() => Step::Signal(msg),
                call = incoming.recv(), if incoming_open => match call {
                    Some(call) => Step::Incoming(call),
                    None => {
                        incoming_open = false;
                        continue;
                    }
                },
                Some(report) = manager.next_report() => Step::Report(report),
            };

            match step {
                Step::Signal(Some(msg)) => manager.handle_signal(msg).await,
                Step::Signal(None) => {
                    warn!(room = %config.room_id, "Signaling channel closed");
                    break;
                }
                Step::Incoming(call) => {
                    manager.accept(call);
                }
                Step::Report(report) => manager.apply_report(report),
                Step::Leave => {
                    info!(room = %config.room_id, peer = %peer_id, "Leaving room");
                    if let Err(e) = signaling.send(ClientMessage::LeaveRoom) {
                        debug!(room = %config.room_id, "Leave not delivered: {}", e);
                    }
                    break;
                }
            }
        }

        manager.close_all().await;
        signaling.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LoopbackHub, RecordingGrid};
    use futures::StreamExt;
    use tokio_tungstenite::tungstenite::Message;

    async fn next_client_message<S>(ws: &mut S) -> ClientMessage
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return ClientMessage::decode(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("socket ended early: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_media_failure_never_touches_signaling() {
        let hub = LoopbackHub::new();
        let grid = Arc::new(RecordingGrid::new());
        // Nothing listens here; reaching the connect step would fail differently
        let config = ClientConfig::new(
            "ws://127.0.0.1:9/ws",
            RoomId::parse("abc").unwrap(),
        );
        let client = RoomClient::new(hub.failing_devices(), hub.endpoint(), grid.clone(), config);

        let err = client.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::Media(_)));
        assert_eq!(grid.snapshot().local, None);
        assert_eq!(hub.open_endpoints(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_signaling_is_reported() {
        let hub = LoopbackHub::new();
        let grid = Arc::new(RecordingGrid::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::new(format!("ws://{addr}/ws"), RoomId::parse("abc").unwrap());
        let client = RoomClient::new(hub.devices(), hub.endpoint(), grid.clone(), config);

        let err = client.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::Signaling(_)));
        // Preview was already up; the endpoint was never opened
        assert!(grid.snapshot().local.is_some());
        assert_eq!(hub.open_endpoints(), 0);
    }

    #[tokio::test]
    async fn test_leave_sends_leave_room_then_closes() {
        let hub = LoopbackHub::new();
        let grid = Arc::new(RecordingGrid::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let leave = CancellationToken::new();

        let server_leave = leave.clone();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let join = next_client_message(&mut ws).await;
            server_leave.cancel();
            let leave_msg = next_client_message(&mut ws).await;
            (join, leave_msg)
        });

        let config = ClientConfig::new(format!("ws://{addr}/ws"), RoomId::parse("abc").unwrap());
        let client = RoomClient::new(hub.devices(), hub.endpoint(), grid.clone(), config);
        client.run(leave).await.unwrap();

        let (join, leave_msg) = server.await.unwrap();
        assert!(matches!(
            join,
            ClientMessage::JoinRoom { ref room_id, .. } if room_id.as_str() == "abc"
        ));
        assert_eq!(leave_msg, ClientMessage::LeaveRoom);
    }
}
