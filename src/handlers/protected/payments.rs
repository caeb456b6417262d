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
use crate::policy::{Selector, PAYMENTS};

/// POST /payments
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    resource::create(&state, &headers, &PAYMENTS, None, payload).await
}

/// GET /payments; clients see payments for their own athletes only
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Row>> {
    resource::list(&state, &headers, &PAYMENTS, Selector::all()).await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::fetch(&state, &headers, &PAYMENTS, Selector::by_id(id)).await
}

/// PUT /payments/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::update(&state, &headers, &PAYMENTS, id, None, payload).await
}

/// DELETE /payments/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let id = parse_id("id", &id)?;
    resource::remove(&state, &headers, &PAYMENTS, id, None).await
}
