//! The external media capability: device capture and direct peer calls.

use room_protocol::PeerId;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::MediaError;

/// `getUserMedia`-style capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// The locally captured stream. Shared read-only by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    id: Arc<str>,
    constraints: MediaConstraints,
}

impl LocalStream {
    pub fn new(id: impl Into<Arc<str>>, constraints: MediaConstraints) -> Self {
        Self {
            id: id.into(),
            constraints,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn constraints(&self) -> MediaConstraints {
        self.constraints
    }
}

/// Media arriving from a remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub peer_id: PeerId,
    pub stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// The remote side's media arrived.
    Stream(RemoteStream),
    /// The remote side hung up.
    Closed,
}

/// One direct call, placed or answered.
///
/// Hanging up from either end is observed by the other end as
/// [`CallEvent::Closed`].
#[derive(Debug)]
pub struct MediaCall {
    remote: PeerId,
    events: mpsc::UnboundedReceiver<CallEvent>,
    events_done: bool,
    hangup: CancellationToken,
}

impl MediaCall {
    pub fn new(
        remote: PeerId,
        events: mpsc::UnboundedReceiver<CallEvent>,
        hangup: CancellationToken,
    ) -> Self {
        Self {
            remote,
            events,
            events_done: false,
            hangup,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn hang_up(&self) {
        self.hangup.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.hangup.is_cancelled()
    }

    /// Next event of this call. Once the event feed runs dry the call stays
    /// open until someone hangs up.
    pub async fn next_event(&mut self) -> CallEvent {
        if !self.events_done {
            let next = tokio::select! {
                biased;
                event = self.events.recv() => event,
                _ = self.hangup.cancelled() => Some(CallEvent::Closed),
            };
            match next {
                Some(event) => return event,
                None => self.events_done = true,
            }
        }
        self.hangup.cancelled().await;
        CallEvent::Closed
    }
}

/// A call offered to us that has not been answered yet.
#[derive(Debug)]
pub struct IncomingCall {
    from: PeerId,
    call: MediaCall,
    accept: oneshot::Sender<LocalStream>,
}

impl IncomingCall {
    /// `call` is our end of the call; our stream is delivered through `accept`.
    pub fn new(from: PeerId, call: MediaCall, accept: oneshot::Sender<LocalStream>) -> Self {
        Self { from, call, accept }
    }

    pub fn caller(&self) -> &PeerId {
        &self.from
    }

    /// Answer with `local` and take over the call.
    pub fn accept(self, local: &LocalStream) -> MediaCall {
        let _ = self.accept.send(local.clone());
        self.call
    }

    pub fn reject(self) {
        self.call.hang_up();
    }
}

/// Result of opening the media endpoint: our address plus the calls offered to it.
#[derive(Debug)]
pub struct OpenEndpoint {
    pub peer_id: PeerId,
    pub incoming: mpsc::UnboundedReceiver<IncomingCall>,
}

/// Camera and microphone access.
pub trait MediaDevices: Send + Sync {
    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> impl Future<Output = Result<LocalStream, MediaError>> + Send;
}

/// The peer-to-peer call service (PeerJS in the browser).
pub trait MediaEndpoint: Send + Sync + 'static {
    /// Register with the call service. Resolves once a peer id is assigned.
    fn open(&mut self) -> impl Future<Output = Result<OpenEndpoint, MediaError>> + Send;

    /// Place a call to `remote` carrying `local`.
    fn call(&self, remote: &PeerId, local: &LocalStream) -> MediaCall;

    fn answer(&self, incoming: IncomingCall, local: &LocalStream) -> MediaCall {
        incoming.accept(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn peer(id: &str) -> PeerId {
        PeerId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_event_then_hangup() {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let mut call = MediaCall::new(peer("p2"), rx, token.clone());

        let stream = RemoteStream {
            peer_id: peer("p2"),
            stream_id: "s".to_string(),
        };
        tx.send(CallEvent::Stream(stream.clone())).unwrap();
        drop(tx);

        assert_eq!(call.next_event().await, CallEvent::Stream(stream));

        // The feed is done but the call is still up
        let pending = tokio::time::timeout(Duration::from_millis(20), call.next_event()).await;
        assert!(pending.is_err());

        token.cancel();
        assert_eq!(call.next_event().await, CallEvent::Closed);
        assert!(call.is_closed());
    }

    #[tokio::test]
    async fn test_accept_delivers_local_stream() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let (accept_tx, accept_rx) = oneshot::channel();
        let incoming = IncomingCall::new(
            peer("caller"),
            MediaCall::new(peer("caller"), rx, CancellationToken::new()),
            accept_tx,
        );
        assert_eq!(incoming.caller(), &peer("caller"));

        let local = LocalStream::new("mine", MediaConstraints::default());
        let call = incoming.accept(&local);
        assert_eq!(call.remote(), &peer("caller"));
        assert_eq!(accept_rx.await.unwrap().id(), "mine");
    }

    #[tokio::test]
    async fn test_reject_hangs_up() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let (accept_tx, accept_rx) = oneshot::channel();
        let token = CancellationToken::new();
        let incoming = IncomingCall::new(
            peer("caller"),
            MediaCall::new(peer("caller"), rx, token.clone()),
            accept_tx,
        );
        incoming.reject();
        assert!(token.is_cancelled());
        assert!(accept_rx.await.is_err());
    }
}
