//! Room Protocol - signaling events exchanged between room clients and the server
//!
//! The signaling channel carries only room membership: who joined, who left,
//! and the peer identifiers used to place direct media calls. Media never
//! travels over it.
//!
//! Every frame is a JSON object tagged by `"type"`:
//!
//! ```
//! use room_protocol::{ClientMessage, PeerId, RoomId};
//!
//! let join = ClientMessage::JoinRoom {
//!     room_id: RoomId::parse("abc").unwrap(),
//!     peer_id: PeerId::parse("p1").unwrap(),
//! };
//! let json = serde_json::to_string(&join).unwrap();
//! assert_eq!(json, r#"{"type":"join-room","room_id":"abc","peer_id":"p1"}"#);
//! ```

mod ids;
mod message;

pub use ids::{IdError, MAX_ID_LEN, PeerId, RoomId};
pub use message::{ClientMessage, ServerMessage, WireError};

/// Path of the signaling WebSocket on the room server.
pub const SIGNALING_PATH: &str = "/ws";
