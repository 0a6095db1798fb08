use room_protocol::{PeerId, RoomId, ServerMessage};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::rooms::{Departure, JoinOutcome, Participant, Rooms, TransportId};
use crate::metrics::ServerMetrics;

/// Outbound queue of one signaling connection.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("membership registry is not running")]
    Unavailable,
}

/// Commands that can be sent to the registry actor
#[derive(Debug)]
enum RegistryCommand {
    Join {
        room_id: RoomId,
        transport: TransportId,
        peer_id: PeerId,
        outbound: Outbound,
        respond_to: oneshot::Sender<JoinOutcome>,
    },
    Leave {
        transport: TransportId,
        respond_to: oneshot::Sender<Option<Departure>>,
    },
    Snapshot {
        room_id: RoomId,
        respond_to: oneshot::Sender<Vec<Participant>>,
    },
    Stats {
        respond_to: oneshot::Sender<RegistryStats>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub participants: usize,
}

/// Handle to the membership registry. Cheap to clone; one per connection handler.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Register `peer_id` under `room_id` for this connection and announce it
    /// to the rest of the room. Repeated joins from one transport are ignored.
    pub async fn join(
        &self,
        room_id: RoomId,
        transport: TransportId,
        peer_id: PeerId,
        outbound: Outbound,
    ) -> Result<JoinOutcome, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Join {
                room_id,
                transport,
                peer_id,
                outbound,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::Unavailable)?;
        rx.await.map_err(|_| RegistryError::Unavailable)
    }

    /// Remove this connection from its room and announce the departure.
    /// Unknown transports are a no-op.
    pub async fn leave(&self, transport: TransportId) -> Result<Option<Departure>, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Leave {
                transport,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::Unavailable)?;
        rx.await.map_err(|_| RegistryError::Unavailable)
    }

    pub async fn snapshot(&self, room_id: RoomId) -> Result<Vec<Participant>, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Snapshot {
                room_id,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::Unavailable)?;
        rx.await.map_err(|_| RegistryError::Unavailable)
    }

    pub async fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Stats { respond_to: tx })
            .await
            .map_err(|_| RegistryError::Unavailable)?;
        rx.await.map_err(|_| RegistryError::Unavailable)
    }
}

/// The actor that owns all room membership.
///
/// Commands are handled one at a time in arrival order, so a connection's
/// leave can never overtake its join.
pub struct MembershipRegistry {
    rooms: Rooms,
    outbound: HashMap<TransportId, Outbound>,
    receiver: mpsc::Receiver<RegistryCommand>,
    metrics: Arc<ServerMetrics>,
}

impl MembershipRegistry {
    /// Start the registry task. It stops once every handle has been dropped.
    pub fn spawn(metrics: Arc<ServerMetrics>) -> RegistryHandle {
        let (sender, receiver) = mpsc::channel(256);
        let actor = MembershipRegistry {
            rooms: Rooms::new(),
            outbound: HashMap::new(),
            receiver,
            metrics,
        };
        tokio::spawn(actor.run());
        RegistryHandle { sender }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }
        debug!("Membership registry stopped");
    }

    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Join {
                room_id,
                transport,
                peer_id,
                outbound,
                respond_to,
            } => {
                let outcome = self.join(room_id, transport, peer_id, outbound);
                let _ = respond_to.send(outcome);
            }
            RegistryCommand::Leave {
                transport,
                respond_to,
            } => {
                let departure = self.leave(transport);
                let _ = respond_to.send(departure);
            }
            RegistryCommand::Snapshot {
                room_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.rooms.members(&room_id).to_vec());
            }
            RegistryCommand::Stats { respond_to } => {
                let _ = respond_to.send(RegistryStats {
                    rooms: self.rooms.room_count(),
                    participants: self.rooms.participant_count(),
                });
            }
        }
    }

    fn join(
        &mut self,
        room_id: RoomId,
        transport: TransportId,
        peer_id: PeerId,
        outbound: Outbound,
    ) -> JoinOutcome {
        let outcome = self
            .rooms
            .join(room_id.clone(), transport, peer_id.clone());

        match &outcome {
            JoinOutcome::Joined { notify } => {
                self.outbound.insert(transport, outbound);
                self.metrics.participant_joined();
                info!(
                    room = %room_id,
                    peer = %peer_id,
                    conn = %transport,
                    existing = notify.len(),
                    "Participant joined"
                );
                self.broadcast(notify, ServerMessage::UserConnected { peer_id });
            }
            JoinOutcome::AlreadyJoined { room_id: existing } => {
                self.metrics.duplicate_join();
                debug!(conn = %transport, room = %existing, "Ignoring repeated join-room");
            }
        }

        outcome
    }

    fn leave(&mut self, transport: TransportId) -> Option<Departure> {
        self.outbound.remove(&transport);
        let departure = self.rooms.leave(transport)?;

        self.metrics.participant_left();
        info!(
            room = %departure.room_id,
            peer = %departure.peer_id,
            conn = %transport,
            remaining = departure.notify.len(),
            "Participant left"
        );
        self.broadcast(
            &departure.notify,
            ServerMessage::UserDisconnected {
                peer_id: departure.peer_id.clone(),
            },
        );

        Some(departure)
    }

    /// Fire-and-forget delivery. A closed queue belongs to a connection whose
    /// own leave is already on its way.
    fn broadcast(&self, recipients: &[TransportId], msg: ServerMessage) {
        let mut delivered = 0;
        for transport in recipients {
            match self.outbound.get(transport) {
                Some(tx) if tx.send(msg.clone()).is_ok() => delivered += 1,
                _ => debug!(conn = %transport, "Recipient queue closed, skipping"),
            }
        }
        self.metrics.broadcasts_sent(delivered);
    }
}
