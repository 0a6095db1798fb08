//! Room Resolver: allocates room tokens and serves the room view.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use room_protocol::{PeerId, RoomId};
use serde::Serialize;
use tracing::debug;

use crate::AppState;
use crate::views;

/// `GET /` - send the browser to a brand new room.
pub async fn new_room_handler() -> Redirect {
    let room_id = RoomId::generate();
    debug!(room = %room_id, "Allocated room");
    Redirect::to(&format!("/{room_id}"))
}

/// `GET /{room_id}` - render the room view for an existing or new room.
pub async fn room_page_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match RoomId::parse(room_id) {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    Html(views::room_page(&room_id, &state.config).into_string()).into_response()
}

#[derive(Debug, Serialize)]
pub struct RoomMembers {
    pub room_id: RoomId,
    pub participants: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
pub struct MemberView {
    pub peer_id: PeerId,
    pub joined_at: DateTime<Utc>,
}

/// `GET /api/rooms/{room_id}` - current participants. Unknown rooms are empty.
pub async fn room_members_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Response {
    let room_id = match RoomId::parse(room_id) {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match state.registry.snapshot(room_id.clone()).await {
        Ok(members) => Json(RoomMembers {
            room_id,
            participants: members
                .into_iter()
                .map(|p| MemberView {
                    peer_id: p.peer_id,
                    joined_at: p.joined_at,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use crate::registry::TransportId;

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(new_room_handler))
            .route("/{room_id}", get(room_page_handler))
            .route("/api/rooms/{room_id}", get(room_members_handler))
            .with_state(state)
    }

    async fn body_string(resp: Response) -> String {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects_to_fresh_room() {
        let app = test_router(crate::test_helpers::test_app_state());

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let first = resp.headers()["location"].to_str().unwrap().to_string();
        let token = first.strip_prefix('/').unwrap();
        assert!(uuid::Uuid::parse_str(token).is_ok());

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second = resp.headers()["location"].to_str().unwrap().to_string();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_room_page_embeds_room_id() {
        let app = test_router(crate::test_helpers::test_app_state());

        let resp = app
            .oneshot(Request::builder().uri("/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains(r#""roomId":"abc""#));
        assert!(html.contains("video-grid"));
    }

    #[tokio::test]
    async fn test_room_members_lists_joined_peers() {
        let state = crate::test_helpers::test_app_state();
        let (tx, _rx) = mpsc::unbounded_channel();
        state
            .registry
            .join(
                RoomId::parse("abc").unwrap(),
                TransportId::new(),
                PeerId::parse("p1").unwrap(),
                tx,
            )
            .await
            .unwrap();
        let app = test_router(state);

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["room_id"], "abc");
        assert_eq!(json["participants"][0]["peer_id"], "p1");

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/empty")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert!(json["participants"].as_array().unwrap().is_empty());
    }
}
