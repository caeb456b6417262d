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
use crate::policy::{Selector, ATHLETES};

/// POST /clients/:clientId/athletes
pub async fn create(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let client_id = parse_id("clientId", &client_id)?;
    resource::create(&state, &headers, &ATHLETES, Some(client_id), payload).await
}

/// GET /clients/:clientId/athletes
pub async fn list(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Vec<Row>> {
    let client_id = parse_id("clientId", &client_id)?;
    resource::list(&state, &headers, &ATHLETES, Selector::under(client_id)).await
}

/// GET /clients/:clientId/athletes/:athleteId
pub async fn get(
    State(state): State<AppState>,
    Path((client_id, athlete_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let client_id = parse_id("clientId", &client_id)?;
    let athlete_id = parse_id("athleteId", &athlete_id)?;
    let selector = Selector::under(client_id).with_id(athlete_id);
    resource::fetch(&state, &headers, &ATHLETES, selector).await
}

/// PUT /clients/:clientId/athletes/:athleteId
pub async fn update(
    State(state): State<AppState>,
    Path((client_id, athlete_id)): Path<(String, String)>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let client_id = parse_id("clientId", &client_id)?;
    let athlete_id = parse_id("athleteId", &athlete_id)?;
    resource::update(&state, &headers, &ATHLETES, athlete_id, Some(client_id), payload).await
}

/// DELETE /clients/:clientId/athletes/:athleteId flips `active`; a second
/// call restores the athlete.
pub async fn delete(
    State(state): State<AppState>,
    Path((client_id, athlete_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let client_id = parse_id("clientId", &client_id)?;
    let athlete_id = parse_id("athleteId", &athlete_id)?;
    resource::remove(&state, &headers, &ATHLETES, athlete_id, Some(client_id)).await
}
