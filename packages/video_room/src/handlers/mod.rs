mod health;
mod rooms;
mod websocket;

pub use health::{health_handler, health_live_handler, metrics_handler};
pub use rooms::{new_room_handler, room_members_handler, room_page_handler};
pub use websocket::signaling_websocket_handler;
