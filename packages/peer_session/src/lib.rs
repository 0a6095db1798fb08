//! Peer Session - the client half of a video room
//!
//! A [`RoomClient`] captures local media once, joins a room over the
//! signaling channel and then keeps one direct [`MediaCall`] per remote
//! participant. Each call is driven by its own session task
//! (`Pending -> Active -> Closed`) which owns the call and the display
//! surface it renders into.
//!
//! Media and display are reached through the [`MediaDevices`],
//! [`MediaEndpoint`] and [`VideoGrid`] traits so the same session logic
//! runs against a browser bridge or the in-process loopback in
//! [`testing`].
//!
//! # Example
//!
//! ```no_run
//! use peer_session::{ClientConfig, MediaDevices, MediaEndpoint, RoomClient, SessionError, VideoGrid};
//! use room_protocol::RoomId;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn join<D, E, G>(devices: D, endpoint: E, grid: Arc<G>) -> Result<(), SessionError>
//! where
//!     D: MediaDevices,
//!     E: MediaEndpoint,
//!     G: VideoGrid,
//! {
//!     let room = RoomId::parse("abc").expect("valid room id");
//!     let config = ClientConfig::new("ws://127.0.0.1:3000/ws", room);
//!     RoomClient::new(devices, endpoint, grid, config)
//!         .run(CancellationToken::new())
//!         .await
//! }
//! ```

mod client;
mod display;
mod error;
mod manager;
mod media;
mod session;
mod signaling;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{ClientConfig, RoomClient};
pub use display::VideoGrid;
pub use error::{MediaError, SessionError, SignalingError};
pub use manager::SessionManager;
pub use media::{
    CallEvent, IncomingCall, LocalStream, MediaCall, MediaConstraints, MediaDevices,
    MediaEndpoint, OpenEndpoint, RemoteStream,
};
pub use session::{CloseReason, Direction, SessionConfig, SessionReport, SessionState};
pub use signaling::SignalingClient;
