//! One direct call to one remote participant.
//!
//! A session runs as its own task and owns its call and display surface.
//! It moves `Pending -> Active -> Closed` and reports each transition to the
//! manager that spawned it.

use room_protocol::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::display::VideoGrid;
use crate::media::{CallEvent, MediaCall, RemoteStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Call placed or answered, no remote media yet.
    Pending,
    /// Remote media attached to the surface.
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// We placed the call after a `user-connected`.
    Outbound,
    /// We answered a call placed by the remote side.
    Inbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Closed by us: `user-disconnected`, duplicate teardown, or shutdown.
    Local,
    /// The remote side hung up.
    Remote,
    /// Still `Pending` when [`SessionConfig::pending_timeout`] ran out.
    PendingTimeout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a session may wait for remote media. `None` waits forever.
    pub pending_timeout: Option<Duration>,
}

/// Transition reported by a session task. `session` tells apart successive
/// sessions with the same peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReport {
    Active {
        peer_id: PeerId,
        session: u64,
    },
    Closed {
        peer_id: PeerId,
        session: u64,
        reason: CloseReason,
    },
}

pub(crate) struct PeerSession<G: VideoGrid> {
    id: u64,
    peer_id: PeerId,
    direction: Direction,
    state: SessionState,
    call: MediaCall,
    surface: Option<G::Surface>,
    grid: Arc<G>,
    reports: mpsc::UnboundedSender<SessionReport>,
    shutdown: CancellationToken,
    pending_deadline: Option<Instant>,
}

/// What a session is about: which call, with whom, and how it is stopped.
pub(crate) struct SessionSeed {
    pub id: u64,
    pub peer_id: PeerId,
    pub direction: Direction,
    pub call: MediaCall,
    pub shutdown: CancellationToken,
}

enum Step {
    Event(CallEvent),
    Shutdown,
    Timeout,
}

impl<G: VideoGrid> PeerSession<G> {
    pub(crate) fn new(
        seed: SessionSeed,
        grid: Arc<G>,
        reports: mpsc::UnboundedSender<SessionReport>,
        config: SessionConfig,
    ) -> Self {
        let surface = grid.create_surface(&seed.peer_id);
        Self {
            id: seed.id,
            peer_id: seed.peer_id,
            direction: seed.direction,
            state: SessionState::Pending,
            call: seed.call,
            surface: Some(surface),
            grid,
            reports,
            shutdown: seed.shutdown,
            pending_deadline: config.pending_timeout.map(|t| Instant::now() + t),
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(peer = %self.peer_id, direction = ?self.direction, "Session pending");

        while self.state != SessionState::Closed {
            let deadline = match self.state {
                SessionState::Pending => self.pending_deadline,
                _ => None,
            };

            let step = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Step::Shutdown,
                event = self.call.next_event() => Step::Event(event),
                _ = wait_until(deadline) => Step::Timeout,
            };

            match step {
                Step::Event(CallEvent::Stream(stream)) => self.on_stream(stream),
                Step::Event(CallEvent::Closed) => self.close(CloseReason::Remote),
                Step::Shutdown => self.close(CloseReason::Local),
                Step::Timeout => self.close(CloseReason::PendingTimeout),
            }
        }
    }

    fn on_stream(&mut self, stream: RemoteStream) {
        if self.state != SessionState::Pending {
            debug!(peer = %self.peer_id, "Ignoring repeated remote stream");
            return;
        }
        self.state = SessionState::Active;
        if let Some(surface) = self.surface.as_mut() {
            self.grid.attach(surface, stream);
        }
        info!(peer = %self.peer_id, direction = ?self.direction, "Session active");
        let _ = self.reports.send(SessionReport::Active {
            peer_id: self.peer_id.clone(),
            session: self.id,
        });
    }

    fn close(&mut self, reason: CloseReason) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.call.hang_up();
        if let Some(surface) = self.surface.take() {
            self.grid.remove(surface);
        }
        info!(peer = %self.peer_id, reason = ?reason, "Session closed");
        let _ = self.reports.send(SessionReport::Closed {
            peer_id: self.peer_id.clone(),
            session: self.id,
            reason,
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
