use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use super::resource;
use crate::app::AppState;
use crate::database::Row;
use crate::handlers::utils::parse_id;
use crate::middleware::ApiResult;
use crate::policy::{Selector, TOURNAMENTS};

/// POST /tournaments
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    resource::create(&state, &headers, &TOURNAMENTS, None, payload).await
}

/// GET /tournaments lists only tournaments that have not ended yet
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Row>> {
    resource::list(&state, &headers, &TOURNAMENTS, Selector::all()).await
}

/// GET /tournaments/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::fetch(&state, &headers, &TOURNAMENTS, Selector::by_id(id)).await
}

/// PUT /tournaments/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::update(&state, &headers, &TOURNAMENTS, id, None, payload).await
}

/// DELETE /tournaments/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::remove(&state, &headers, &TOURNAMENTS, id, None).await
}
