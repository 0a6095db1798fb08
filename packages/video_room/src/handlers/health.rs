use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::metrics;

/// Health check endpoint - returns server status
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let metrics = state.metrics.snapshot();

    match state.registry.stats().await {
        Ok(stats) => Json(metrics::HealthStatus {
            status: "healthy".to_string(),
            rooms: stats.rooms as u64,
            participants: stats.participants as u64,
            connections: metrics.connections.active,
            uptime_secs: metrics.uptime_secs,
        })
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unavailable",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

/// Metrics endpoint - returns detailed server metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}
