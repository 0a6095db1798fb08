//! Signaling WebSocket
//!
//! One connection per browser tab. Each connection gets a fresh transport id,
//! forwards `join-room` / `leave-room` to the membership registry, and relays
//! membership events back to the client. A dropped connection is a leave.

mod handler;

pub use handler::handle_signaling_ws;
