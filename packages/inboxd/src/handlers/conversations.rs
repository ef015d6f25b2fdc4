use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer};

use crate::AppState;
use crate::service::{DEFAULT_LIMIT, ServiceError};

/// Absent or non-numeric paging values fall back to defaults instead of
/// rejecting the request.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[derive(Deserialize)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "lenient_i64")]
    page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    limit: Option<i64>,
}

fn resolve_paging(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (
        page.unwrap_or(1).max(1),
        limit.unwrap_or(DEFAULT_LIMIT).max(1),
    )
}

pub async fn recent_conversations(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Response {
    let (page, limit) = resolve_paging(params.page, params.limit);

    match state.service.list_recent(page, limit).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e, "list recent conversations"),
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    limit: Option<i64>,
}

pub async fn search_conversations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    // Rejected here, before any store access.
    let term = params.q.as_deref().map(str::trim).unwrap_or("");
    if term.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Search term is required" })),
        )
            .into_response();
    }

    let (page, limit) = resolve_paging(params.page, params.limit);

    match state.service.search(term, page, limit).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e, "search conversations"),
    }
}

fn error_response(err: ServiceError, action: &str) -> Response {
    match err {
        ServiceError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
        ServiceError::Store(e) => {
            tracing::error!("Failed to {}: {}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
