//! Room membership bookkeeping.
//!
//! `Rooms` is the plain data structure behind the registry actor. It does no
//! I/O: every mutation returns the set of connections that must be told about
//! it, and the caller does the telling.

use chrono::{DateTime, Utc};
use room_protocol::{PeerId, RoomId};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier the signaling server assigns to each WebSocket connection.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TransportId(Uuid);

impl TransportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One connected member of a room.
#[derive(Debug, Clone)]
pub struct Participant {
    pub transport: TransportId,
    pub peer_id: PeerId,
    pub joined_at: DateTime<Utc>,
}

/// Result of a `join` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly registered; `notify` are the other members, in join order.
    Joined { notify: Vec<TransportId> },
    /// The transport was already registered. Nothing changed.
    AlreadyJoined { room_id: RoomId },
}

/// A participant removed by `leave`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub peer_id: PeerId,
    /// Members still in the room, in join order.
    pub notify: Vec<TransportId>,
}

#[derive(Debug, Default)]
pub struct Rooms {
    rooms: HashMap<RoomId, Vec<Participant>>,
    by_transport: HashMap<TransportId, RoomId>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, room_id: RoomId, transport: TransportId, peer_id: PeerId) -> JoinOutcome {
        if let Some(existing) = self.by_transport.get(&transport) {
            return JoinOutcome::AlreadyJoined {
                room_id: existing.clone(),
            };
        }

        let members = self.rooms.entry(room_id.clone()).or_default();
        let notify = members.iter().map(|p| p.transport).collect();
        members.push(Participant {
            transport,
            peer_id,
            joined_at: Utc::now(),
        });
        self.by_transport.insert(transport, room_id);

        JoinOutcome::Joined { notify }
    }

    /// Remove `transport` from whichever room holds it. `None` if it holds none.
    pub fn leave(&mut self, transport: TransportId) -> Option<Departure> {
        let room_id = self.by_transport.remove(&transport)?;
        let members = self.rooms.get_mut(&room_id)?;
        let index = members.iter().position(|p| p.transport == transport)?;
        let removed = members.remove(index);
        let notify = members.iter().map(|p| p.transport).collect();

        if members.is_empty() {
            self.rooms.remove(&room_id);
        }

        Some(Departure {
            room_id,
            peer_id: removed.peer_id,
            notify,
        })
    }

    /// Members of `room_id` in join order. Unknown rooms are empty.
    pub fn members(&self, room_id: &RoomId) -> &[Participant] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn room_of(&self, transport: TransportId) -> Option<&RoomId> {
        self.by_transport.get(&transport)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.by_transport.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomId {
        RoomId::parse(id).unwrap()
    }

    fn peer(id: &str) -> PeerId {
        PeerId::parse(id).unwrap()
    }

    fn peers_in(rooms: &Rooms, id: &str) -> Vec<String> {
        rooms
            .members(&room(id))
            .iter()
            .map(|p| p.peer_id.to_string())
            .collect()
    }

    #[test]
    fn test_second_joiner_notifies_only_existing_member() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        let b = TransportId::new();

        assert_eq!(
            rooms.join(room("abc"), a, peer("p1")),
            JoinOutcome::Joined { notify: vec![] }
        );
        assert_eq!(
            rooms.join(room("abc"), b, peer("p2")),
            JoinOutcome::Joined { notify: vec![a] }
        );
        assert_eq!(peers_in(&rooms, "abc"), vec!["p1", "p2"]);
    }

    #[test]
    fn test_joiner_is_never_in_its_own_notify_list() {
        let mut rooms = Rooms::new();
        let transports: Vec<TransportId> = (0..5).map(|_| TransportId::new()).collect();
        for (i, t) in transports.iter().enumerate() {
            match rooms.join(room("r"), *t, peer(&format!("p{i}"))) {
                JoinOutcome::Joined { notify } => {
                    assert!(!notify.contains(t));
                    assert_eq!(notify.len(), i);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn test_duplicate_join_is_noop() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        let b = TransportId::new();
        rooms.join(room("abc"), a, peer("p1"));
        rooms.join(room("abc"), b, peer("p2"));

        assert_eq!(
            rooms.join(room("abc"), b, peer("p2")),
            JoinOutcome::AlreadyJoined {
                room_id: room("abc")
            }
        );
        // A different room under the same transport is ignored too
        assert_eq!(
            rooms.join(room("other"), b, peer("p2")),
            JoinOutcome::AlreadyJoined {
                room_id: room("abc")
            }
        );
        assert_eq!(peers_in(&rooms, "abc"), vec!["p1", "p2"]);
        assert_eq!(rooms.participant_count(), 2);
        assert_eq!(rooms.room_count(), 1);
    }

    #[test]
    fn test_leave_notifies_remaining_members() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        let b = TransportId::new();
        rooms.join(room("abc"), a, peer("p1"));
        rooms.join(room("abc"), b, peer("p2"));

        let departure = rooms.leave(b).unwrap();
        assert_eq!(departure.room_id, room("abc"));
        assert_eq!(departure.peer_id, peer("p2"));
        assert_eq!(departure.notify, vec![a]);
        assert_eq!(peers_in(&rooms, "abc"), vec!["p1"]);
    }

    #[test]
    fn test_leave_twice_yields_one_departure() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        rooms.join(room("abc"), a, peer("p1"));

        assert!(rooms.leave(a).is_some());
        assert!(rooms.leave(a).is_none());
        assert!(rooms.leave(TransportId::new()).is_none());
    }

    #[test]
    fn test_empty_rooms_are_pruned() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        rooms.join(room("abc"), a, peer("p1"));
        assert_eq!(rooms.room_count(), 1);

        rooms.leave(a);
        assert_eq!(rooms.room_count(), 0);
        assert!(rooms.members(&room("abc")).is_empty());
        assert!(rooms.room_of(a).is_none());
    }

    #[test]
    fn test_membership_matches_join_leave_history() {
        let mut rooms = Rooms::new();
        let t: Vec<TransportId> = (0..6).map(|_| TransportId::new()).collect();

        rooms.join(room("x"), t[0], peer("a"));
        rooms.join(room("y"), t[1], peer("b"));
        rooms.join(room("x"), t[2], peer("c"));
        rooms.leave(t[0]);
        rooms.join(room("x"), t[3], peer("d"));
        rooms.join(room("y"), t[4], peer("e"));
        rooms.leave(t[4]);
        rooms.leave(t[4]);
        rooms.join(room("x"), t[5], peer("f"));
        rooms.leave(t[2]);

        assert_eq!(peers_in(&rooms, "x"), vec!["d", "f"]);
        assert_eq!(peers_in(&rooms, "y"), vec!["b"]);
        assert_eq!(rooms.participant_count(), 3);
        assert_eq!(rooms.room_of(t[1]), Some(&room("y")));
    }

    #[test]
    fn test_rejoin_after_leave_is_a_fresh_join() {
        let mut rooms = Rooms::new();
        let a = TransportId::new();
        let b = TransportId::new();
        rooms.join(room("abc"), a, peer("p1"));
        rooms.join(room("abc"), b, peer("p2"));
        rooms.leave(b);

        assert_eq!(
            rooms.join(room("abc"), b, peer("p2")),
            JoinOutcome::Joined { notify: vec![a] }
        );
    }
}
