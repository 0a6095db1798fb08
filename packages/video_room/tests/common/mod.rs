//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use room_protocol::RoomId;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;

use video_room::config::RoomConfig;
use video_room::{AppState, router};

/// Timeout for each async operation in tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start a room server on a random local port.
pub async fn start_server() -> (SocketAddr, AppState) {
    let state = AppState::new(RoomConfig::default());
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, state)
}

pub fn signaling_url(addr: SocketAddr) -> String {
    format!("ws://{addr}{}", room_protocol::SIGNALING_PATH)
}

/// Peer ids currently registered in `room`, in join order.
pub async fn members(state: &AppState, room: &str) -> Vec<String> {
    state
        .registry
        .snapshot(RoomId::parse(room).expect("valid room id"))
        .await
        .expect("registry is running")
        .into_iter()
        .map(|p| p.peer_id.to_string())
        .collect()
}

/// Poll the registry until `room` holds exactly `count` members.
pub async fn wait_for_members(state: &AppState, room: &str, count: usize) -> Vec<String> {
    timeout(TEST_TIMEOUT, async {
        loop {
            let current = members(state, room).await;
            if current.len() == count {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for room membership")
}
