use serde::{Deserialize, Serialize};

use crate::ids::{PeerId, RoomId};

/// Messages sent FROM a room client TO the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Sent once, after the client's media endpoint has been assigned `peer_id`.
    JoinRoom { room_id: RoomId, peer_id: PeerId },
    /// Explicit departure. Handled exactly like a dropped connection.
    LeaveRoom,
}

/// Messages sent FROM the server TO a room client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Another participant joined a room this client is in.
    UserConnected { peer_id: PeerId },
    /// A participant of this client's room went away.
    UserDisconnected { peer_id: PeerId },
    /// The last client frame was rejected. Registry state is unchanged.
    Error { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed signaling frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str) -> PeerId {
        PeerId::parse(id).unwrap()
    }

    #[test]
    fn test_server_events_use_kebab_case_tags() {
        let msg = ServerMessage::UserConnected { peer_id: peer("p2") };
        assert_eq!(
            msg.encode().unwrap(),
            r#"{"type":"user-connected","peer_id":"p2"}"#
        );
        let msg = ServerMessage::UserDisconnected { peer_id: peer("p2") };
        assert_eq!(
            msg.encode().unwrap(),
            r#"{"type":"user-disconnected","peer_id":"p2"}"#
        );
    }

    #[test]
    fn test_decode_browser_join_frame() {
        let msg =
            ClientMessage::decode(r#"{"type":"join-room","room_id":"abc","peer_id":"p1"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_id: RoomId::parse("abc").unwrap(),
                peer_id: peer("p1"),
            }
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"leave-room"}"#).unwrap(),
            ClientMessage::LeaveRoom
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type_and_bad_ids() {
        assert!(ClientMessage::decode(r#"{"type":"offer","sdp":"x"}"#).is_err());
        assert!(
            ClientMessage::decode(r#"{"type":"join-room","room_id":"","peer_id":"p1"}"#).is_err()
        );
        assert!(ClientMessage::decode("not json").is_err());
    }
}
