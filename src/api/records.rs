// Per-kind record routes, mounted once per entity under `/api/<slug>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::collections::HashMap;

use super::response::{ApiError, ApiResponse, JsonBody};
use super::AppState;
use crate::cascade::CascadeCount;
use crate::entities::{Record, RelationField};
use crate::store;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub cascaded: Vec<CascadeCount>,
}

pub fn routes<R: Record>() -> Router<AppState> {
    Router::new()
        .route("/list", get(list::<R>))
        .route("/archived", get(archived::<R>))
        .route("/create", post(create::<R>))
        .route(
            "/:id",
            get(show::<R>)
                .put(update::<R>)
                .patch(update::<R>)
                .delete(destroy::<R>),
        )
}

/// GET /list - non-archived records, narrowed by any `?<relation>=<name>` pairs.
///
/// Keys that are not relation columns (cache-busters and the like) are ignored.
async fn list<R: Record>(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Vec<R>>>, ApiError> {
    let filters: Vec<(RelationField, String)> = query
        .into_iter()
        .filter_map(|(column, value)| RelationField::from_column(&column).map(|field| (field, value)))
        .collect();

    let records: Vec<R> = state.with_db(|conn| Ok(store::list_matching(conn, &filters)?))?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /archived
async fn archived<R: Record>(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<R>>>, ApiError> {
    let records = state.with_db(|conn| Ok(store::list_archived::<R>(conn)?))?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /:id
async fn show<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<R>>, ApiError> {
    let record = state.with_db(|conn| Ok(store::get::<R>(conn, &id)?))?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /create
async fn create<R: Record>(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<R::New>,
) -> Result<(StatusCode, Json<ApiResponse<R>>), ApiError> {
    let outcome = state.with_db(|conn| Ok(state.engine.create::<R>(conn, body)?))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome.record))))
}

/// PUT|PATCH /:id - archive, restore or plain update
async fn update<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<R::Patch>,
) -> Result<Json<ApiResponse<R>>, ApiError> {
    let outcome = state.with_db(|conn| Ok(state.engine.update::<R>(conn, &id, patch)?))?;
    let warnings = outcome.warnings();
    Ok(Json(ApiResponse::with_warnings(outcome.record, warnings)))
}

/// DELETE /:id - permanent, cascades to dependents
async fn destroy<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let outcome = state.with_db(|conn| Ok(state.engine.delete::<R>(conn, &id)?))?;

    let warnings = outcome.report.warnings();
    let body = DeleteResponse {
        message: outcome.message(),
        cascaded: outcome.report.cascaded,
    };
    Ok(Json(ApiResponse::with_warnings(body, warnings)))
}
