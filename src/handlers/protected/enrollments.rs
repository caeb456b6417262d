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
use crate::policy::{Selector, ENROLLMENTS};

/// POST /enrollments. Clients may only enroll their own athletes and
/// cannot mark the payment as confirmed.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    resource::create(&state, &headers, &ENROLLMENTS, None, payload).await
}

/// GET /enrollments
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Row>> {
    resource::list(&state, &headers, &ENROLLMENTS, Selector::all()).await
}

/// GET /enrollments/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::fetch(&state, &headers, &ENROLLMENTS, Selector::by_id(id)).await
}

/// PUT /enrollments/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::update(&state, &headers, &ENROLLMENTS, id, None, payload).await
}

/// DELETE /enrollments/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::remove(&state, &headers, &ENROLLMENTS, id, None).await
}
