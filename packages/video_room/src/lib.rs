//! Video Room - signaling server for peer-to-peer video rooms
//!
//! Serves the room view, allocates room tokens, and runs the signaling
//! channel that tells room members when peers come and go. Media flows
//! directly between browsers and never touches this server.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod views;
pub mod ws;

#[cfg(test)]
mod test_helpers;

use axum::{Router, routing::get};
use room_protocol::SIGNALING_PATH;
use std::sync::Arc;

use crate::config::RoomConfig;
use crate::metrics::ServerMetrics;
use crate::registry::{MembershipRegistry, RegistryHandle};

#[derive(Clone)]
pub struct AppState {
    /// Membership registry shared by every signaling connection
    pub registry: RegistryHandle,
    pub config: Arc<RoomConfig>,
    /// Server metrics for observability
    pub metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Wire up a fresh registry for `config`. Must run inside a tokio runtime.
    pub fn new(config: RoomConfig) -> Self {
        let metrics = Arc::new(ServerMetrics::new());
        let registry = MembershipRegistry::spawn(metrics.clone());
        Self {
            registry,
            config: Arc::new(config),
            metrics,
        }
    }
}

/// All routes of the room server. Literal routes win over the `/{room_id}` capture.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::new_room_handler))
        .route(SIGNALING_PATH, get(handlers::signaling_websocket_handler))
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/rooms/{room_id}", get(handlers::room_members_handler))
        .route("/{room_id}", get(handlers::room_page_handler))
        .with_state(state)
}
