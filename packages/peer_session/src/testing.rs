//! In-process media for tests.
//!
//! [`LoopbackHub`] plays the part of the call service: every endpoint opened
//! on a hub can call every other one, and answering a call hands each side
//! the other's stream. [`RecordingGrid`] records what would have been drawn.

use room_protocol::PeerId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::display::VideoGrid;
use crate::error::MediaError;
use crate::media::{
    CallEvent, IncomingCall, LocalStream, MediaCall, MediaConstraints, MediaDevices,
    MediaEndpoint, OpenEndpoint, RemoteStream,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<PeerId, mpsc::UnboundedSender<IncomingCall>>,
    next_peer: u64,
    next_stream: u64,
    calls: Vec<(PeerId, PeerId)>,
}

/// Shared switchboard for loopback endpoints.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> LoopbackDevices {
        LoopbackDevices {
            hub: self.clone(),
            deny: false,
        }
    }

    /// Devices that refuse access, like a user declining the permission prompt.
    pub fn failing_devices(&self) -> LoopbackDevices {
        LoopbackDevices {
            hub: self.clone(),
            deny: true,
        }
    }

    pub fn endpoint(&self) -> LoopbackEndpoint {
        LoopbackEndpoint {
            hub: self.clone(),
            peer_id: None,
        }
    }

    /// Number of calls `from` has placed to `to`.
    pub fn calls_placed(&self, from: &PeerId, to: &PeerId) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|(f, t)| f == from && t == to)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.state).calls.len()
    }

    pub fn open_endpoints(&self) -> usize {
        lock(&self.state).endpoints.len()
    }
}

pub struct LoopbackDevices {
    hub: LoopbackHub,
    deny: bool,
}

impl MediaDevices for LoopbackDevices {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalStream, MediaError> {
        if self.deny {
            return Err(MediaError::PermissionDenied("NotAllowedError".to_string()));
        }
        if !constraints.video && !constraints.audio {
            return Err(MediaError::NoDevice);
        }
        let id = {
            let mut state = lock(&self.hub.state);
            state.next_stream += 1;
            format!("stream-{}", state.next_stream)
        };
        Ok(LocalStream::new(id, constraints))
    }
}

pub struct LoopbackEndpoint {
    hub: LoopbackHub,
    peer_id: Option<PeerId>,
}

impl LoopbackEndpoint {
    pub fn peer_id(&self) -> Option<&PeerId> {
        self.peer_id.as_ref()
    }
}

impl MediaEndpoint for LoopbackEndpoint {
    async fn open(&mut self) -> Result<OpenEndpoint, MediaError> {
        let (tx, incoming) = mpsc::unbounded_channel();
        let peer_id = {
            let mut state = lock(&self.hub.state);
            state.next_peer += 1;
            let peer_id = PeerId::parse(format!("peer-{}", state.next_peer))
                .map_err(|e| MediaError::Endpoint(e.to_string()))?;
            state.endpoints.insert(peer_id.clone(), tx);
            peer_id
        };
        self.peer_id = Some(peer_id.clone());
        Ok(OpenEndpoint { peer_id, incoming })
    }

    fn call(&self, remote: &PeerId, local: &LocalStream) -> MediaCall {
        let (caller_tx, caller_rx) = mpsc::unbounded_channel();
        let hangup = CancellationToken::new();
        let call = MediaCall::new(remote.clone(), caller_rx, hangup.clone());

        let Some(caller) = self.peer_id.clone() else {
            hangup.cancel();
            return call;
        };

        let target = {
            let mut state = lock(&self.hub.state);
            state.calls.push((caller.clone(), remote.clone()));
            state.endpoints.get(remote).cloned()
        };
        let Some(target) = target else {
            hangup.cancel();
            return call;
        };

        let (callee_tx, callee_rx) = mpsc::unbounded_channel();
        let (accept_tx, accept_rx) = oneshot::channel::<LocalStream>();
        let incoming = IncomingCall::new(
            caller.clone(),
            MediaCall::new(caller.clone(), callee_rx, hangup.clone()),
            accept_tx,
        );
        if target.send(incoming).is_err() {
            hangup.cancel();
            return call;
        }

        let remote = remote.clone();
        let caller_stream = local.clone();
        tokio::spawn(async move {
            match accept_rx.await {
                Ok(answer) => {
                    let _ = callee_tx.send(CallEvent::Stream(RemoteStream {
                        peer_id: caller,
                        stream_id: caller_stream.id().to_string(),
                    }));
                    let _ = caller_tx.send(CallEvent::Stream(RemoteStream {
                        peer_id: remote,
                        stream_id: answer.id().to_string(),
                    }));
                }
                Err(_) => hangup.cancel(),
            }
        });

        call
    }
}

/// Surface handed out by [`RecordingGrid`].
#[derive(Debug)]
pub struct RecordedSurface {
    id: u64,
}

#[derive(Default)]
struct GridState {
    local: Option<String>,
    next_id: u64,
    tiles: BTreeMap<u64, (PeerId, Option<String>)>,
    removed: Vec<PeerId>,
    attach_count: usize,
}

/// What a [`RecordingGrid`] currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    /// Stream id of the local preview.
    pub local: Option<String>,
    /// Live tiles in creation order with the attached stream id, if any.
    pub tiles: Vec<(PeerId, Option<String>)>,
    /// Peers whose tiles were removed, in removal order.
    pub removed: Vec<PeerId>,
    pub attach_count: usize,
}

impl GridSnapshot {
    /// Peers whose tile has remote media attached.
    pub fn playing(&self) -> Vec<PeerId> {
        self.tiles
            .iter()
            .filter(|(_, stream)| stream.is_some())
            .map(|(peer, _)| peer.clone())
            .collect()
    }
}

#[derive(Default)]
pub struct RecordingGrid {
    state: Mutex<GridState>,
    changed: Notify,
}

impl RecordingGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let state = lock(&self.state);
        GridSnapshot {
            local: state.local.clone(),
            tiles: state.tiles.values().cloned().collect(),
            removed: state.removed.clone(),
            attach_count: state.attach_count,
        }
    }

    /// Wait until `pred` holds for the grid. `false` if `limit` passes first.
    pub async fn wait_for(&self, limit: Duration, pred: impl Fn(&GridSnapshot) -> bool) -> bool {
        let wait = async {
            loop {
                let changed = self.changed.notified();
                if pred(&self.snapshot()) {
                    return;
                }
                changed.await;
            }
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }

    fn update(&self, f: impl FnOnce(&mut GridState)) {
        f(&mut lock(&self.state));
        self.changed.notify_waiters();
    }
}

impl VideoGrid for RecordingGrid {
    type Surface = RecordedSurface;

    fn show_local(&self, stream: &LocalStream) {
        self.update(|state| state.local = Some(stream.id().to_string()));
    }

    fn create_surface(&self, peer: &PeerId) -> RecordedSurface {
        let mut id = 0;
        self.update(|state| {
            state.next_id += 1;
            id = state.next_id;
            state.tiles.insert(id, (peer.clone(), None));
        });
        RecordedSurface { id }
    }

    fn attach(&self, surface: &mut RecordedSurface, stream: RemoteStream) {
        self.update(|state| {
            if let Some(tile) = state.tiles.get_mut(&surface.id) {
                tile.1 = Some(stream.stream_id);
                state.attach_count += 1;
            }
        });
    }

    fn remove(&self, surface: RecordedSurface) {
        self.update(|state| {
            if let Some((peer, _)) = state.tiles.remove(&surface.id) {
                state.removed.push(peer);
            }
        });
    }
}
