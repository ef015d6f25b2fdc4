use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Health check endpoint - server status plus store row counts
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.store.stats().await {
        Ok(stats) => Json(serde_json::json!({
            "status": "ok",
            "contacts": stats.contacts,
            "messages": stats.messages,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to read store stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded" })),
            )
                .into_response()
        }
    }
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Readiness probe - returns 200 if the database accepts connections, and
/// reports which backing representation is serving queries
pub async fn health_ready_handler(State(state): State<AppState>) -> Response {
    let db_ok = state.db.pool.acquire().await.is_ok();

    if db_ok {
        Json(serde_json::json!({
            "status": "ready",
            "backend": state.backend,
            "database": "connected"
        }))
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "backend": state.backend,
                "database": "disconnected"
            })),
        )
            .into_response()
    }
}
