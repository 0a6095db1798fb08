use room_protocol::{PeerId, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::display::VideoGrid;
use crate::media::{IncomingCall, LocalStream, MediaCall, MediaEndpoint};
use crate::session::{
    Direction, PeerSession, SessionConfig, SessionReport, SessionSeed, SessionState,
};

struct SessionEntry {
    id: u64,
    direction: Direction,
    state: SessionState,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps at most one session per remote peer.
///
/// All bookkeeping happens on the caller's task: signaling events, incoming
/// calls and session reports are fed in one at a time. Sessions themselves
/// run concurrently, each on its own task.
pub struct SessionManager<E: MediaEndpoint, G: VideoGrid> {
    endpoint: E,
    grid: Arc<G>,
    local: LocalStream,
    config: SessionConfig,
    sessions: HashMap<PeerId, SessionEntry>,
    next_id: u64,
    reports_tx: mpsc::UnboundedSender<SessionReport>,
    reports_rx: mpsc::UnboundedReceiver<SessionReport>,
}

impl<E: MediaEndpoint, G: VideoGrid> SessionManager<E, G> {
    pub fn new(endpoint: E, grid: Arc<G>, local: LocalStream, config: SessionConfig) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            grid,
            local,
            config,
            sessions: HashMap::new(),
            next_id: 0,
            reports_tx,
            reports_rx,
        }
    }

    /// Apply one signaling event.
    pub async fn handle_signal(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::UserConnected { peer_id } => {
                self.connect(peer_id);
            }
            ServerMessage::UserDisconnected { peer_id } => {
                self.close(&peer_id).await;
            }
            ServerMessage::Error { message } => {
                warn!("Signaling server rejected a frame: {}", message);
            }
        }
    }

    /// Place a call to a newly announced peer. Returns `false` if a session
    /// with that peer already exists.
    pub fn connect(&mut self, peer_id: PeerId) -> bool {
        if self.sessions.contains_key(&peer_id) {
            debug!(peer = %peer_id, "Already in a session, ignoring user-connected");
            return false;
        }
        let call = self.endpoint.call(&peer_id, &self.local);
        info!(peer = %peer_id, "Calling peer");
        self.spawn_session(peer_id, Direction::Outbound, call);
        true
    }

    /// Answer a call placed by a remote peer. Returns `false` (and rejects
    /// the call) if a session with that peer already exists.
    pub fn accept(&mut self, incoming: IncomingCall) -> bool {
        if self.sessions.contains_key(incoming.caller()) {
            debug!(peer = %incoming.caller(), "Already in a session, rejecting call");
            incoming.reject();
            return false;
        }
        let peer_id = incoming.caller().clone();
        let call = self.endpoint.answer(incoming, &self.local);
        info!(peer = %peer_id, "Answered call");
        self.spawn_session(peer_id, Direction::Inbound, call);
        true
    }

    /// Close the session with `peer_id` and wait until its surface is gone.
    /// Returns `false` when there was nothing to close.
    pub async fn close(&mut self, peer_id: &PeerId) -> bool {
        let Some(entry) = self.sessions.remove(peer_id) else {
            debug!(peer = %peer_id, "No session to close");
            return false;
        };
        entry.shutdown.cancel();
        if let Err(e) = entry.task.await {
            warn!(peer = %peer_id, "Session task failed: {}", e);
        }
        true
    }

    pub async fn close_all(&mut self) {
        let peers: Vec<PeerId> = self.sessions.keys().cloned().collect();
        for peer_id in peers {
            self.close(&peer_id).await;
        }
    }

    /// Wait for the next transition reported by any session.
    pub async fn next_report(&mut self) -> Option<SessionReport> {
        self.reports_rx.recv().await
    }

    /// Record a transition. Reports from sessions that were already
    /// replaced or closed are ignored.
    pub fn apply_report(&mut self, report: SessionReport) {
        match report {
            SessionReport::Active { peer_id, session } => {
                match self.sessions.get_mut(&peer_id) {
                    Some(entry) if entry.id == session => entry.state = SessionState::Active,
                    _ => debug!(peer = %peer_id, "Stale activation report"),
                }
            }
            SessionReport::Closed {
                peer_id,
                session,
                reason,
            } => {
                if self.sessions.get(&peer_id).is_some_and(|e| e.id == session) {
                    self.sessions.remove(&peer_id);
                    debug!(peer = %peer_id, reason = ?reason, "Session removed");
                }
            }
        }
    }

    pub fn state(&self, peer_id: &PeerId) -> Option<SessionState> {
        self.sessions.get(peer_id).map(|e| e.state)
    }

    pub fn direction(&self, peer_id: &PeerId) -> Option<Direction> {
        self.sessions.get(peer_id).map(|e| e.direction)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn spawn_session(&mut self, peer_id: PeerId, direction: Direction, call: MediaCall) {
        self.next_id += 1;
        let id = self.next_id;
        let shutdown = CancellationToken::new();
        let seed = SessionSeed {
            id,
            peer_id: peer_id.clone(),
            direction,
            call,
            shutdown: shutdown.clone(),
        };
        let session = PeerSession::new(
            seed,
            self.grid.clone(),
            self.reports_tx.clone(),
            self.config,
        );
        let task = tokio::spawn(session.run());
        self.sessions.insert(
            peer_id,
            SessionEntry {
                id,
                direction,
                state: SessionState::Pending,
                shutdown,
                task,
            },
        );
    }
}
