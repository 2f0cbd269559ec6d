// Activity log routes under `/api/logs`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::response::{ApiError, ApiResponse, JsonBody};
use super::AppState;
use crate::activity_log::{self, LogEntry, NewLogEntry};

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs).post(append_log))
        .route("/clear", post(clear_logs))
        .route("/:id", delete(delete_log))
}

/// GET /api/logs - latest entries first, capped at the page size
async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let limit = query
        .limit
        .map(|l| l.min(state.log_page_size))
        .unwrap_or(state.log_page_size);

    let entries = state.with_db(|conn| Ok(activity_log::list_recent(conn, limit)?))?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// POST /api/logs - direct append; action and status must be known values
async fn append_log(
    State(state): State<AppState>,
    JsonBody(entry): JsonBody<NewLogEntry>,
) -> Result<(StatusCode, Json<ApiResponse<LogEntry>>), ApiError> {
    let logged = state.with_db(|conn| Ok(activity_log::record(conn, &entry)?))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(logged))))
}

/// DELETE /api/logs/:id
async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let deleted = state.with_db(|conn| Ok(activity_log::delete(conn, id)?))?;
    if !deleted {
        return Err(ApiError::not_found(format!("log entry not found: {}", id)));
    }
    Ok(Json(ApiResponse::ok("Log entry deleted successfully".to_string())))
}

/// POST /api/logs/clear
async fn clear_logs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClearResponse>>, ApiError> {
    let cleared = state.with_db(|conn| Ok(activity_log::clear(conn)?))?;
    tracing::info!(cleared, "activity log cleared");

    Ok(Json(ApiResponse::ok(ClearResponse {
        message: "All logs cleared successfully".to_string(),
        cleared,
    })))
}
