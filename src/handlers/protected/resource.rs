//! Request flow shared by every policy-governed resource:
//! guard (roles derived from the policy) → policy statement → store → envelope.
//! Path identifiers are validated by the route handlers before calling in.

use axum::{extract::rejection::JsonRejection, http::HeaderMap, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::Row;
use crate::error::ApiError;
use crate::handlers::utils::json_object;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::{DeleteMode, PolicyError, ResourcePolicy, Selector};
use crate::types::{Action, Caller};

async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    policy: &ResourcePolicy,
    action: Action,
) -> Result<Caller, ApiError> {
    state.guard.authorize(headers, &policy.allowed_roles(action)).await
}

fn not_found(policy: &ResourcePolicy) -> ApiError {
    ApiError::not_found(format!("{} not found", policy.name))
}

pub async fn list(
    state: &AppState,
    headers: &HeaderMap,
    policy: &'static ResourcePolicy,
    selector: Selector,
) -> ApiResult<Vec<Row>> {
    let caller = authorize(state, headers, policy, Action::Read).await?;
    let statement = policy.select(&caller, &selector)?;
    let rows = state.store.fetch_all(&statement).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn fetch(
    state: &AppState,
    headers: &HeaderMap,
    policy: &'static ResourcePolicy,
    selector: Selector,
) -> ApiResult<Row> {
    let caller = authorize(state, headers, policy, Action::Read).await?;
    let statement = policy.select(&caller, &selector)?;
    let row = state.store.fetch_optional(&statement).await?;
    row.map(ApiResponse::success).ok_or_else(|| not_found(policy))
}

pub async fn create(
    state: &AppState,
    headers: &HeaderMap,
    policy: &'static ResourcePolicy,
    parent: Option<Uuid>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let caller = authorize(state, headers, policy, Action::Create).await?;
    let payload = json_object(payload)?;
    let statement = policy.insert(&caller, parent, &payload, &state.config.policy)?;

    match state.store.fetch_optional(&statement).await? {
        Some(row) => {
            tracing::info!(resource = policy.name, user_id = %caller.user_id, id = ?row.get("id"), "created");
            Ok(ApiResponse::created(row).with_message(format!("{} created", policy.name)))
        }
        // only the ownership-guarded insert can come back empty
        None => Err(PolicyError::NotOwner(policy.owner_noun()).into()),
    }
}

pub async fn update(
    state: &AppState,
    headers: &HeaderMap,
    policy: &'static ResourcePolicy,
    id: Uuid,
    parent: Option<Uuid>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let caller = authorize(state, headers, policy, Action::Update).await?;
    let payload = json_object(payload)?;
    let statement = policy.update(&caller, id, parent, &payload, &state.config.policy)?;

    let row = state.store.fetch_optional(&statement).await?.ok_or_else(|| not_found(policy))?;
    tracing::info!(resource = policy.name, user_id = %caller.user_id, %id, "updated");
    Ok(ApiResponse::success(row).with_message(format!("{} updated", policy.name)))
}

pub async fn remove(
    state: &AppState,
    headers: &HeaderMap,
    policy: &'static ResourcePolicy,
    id: Uuid,
    parent: Option<Uuid>,
) -> ApiResult<Row> {
    let caller = authorize(state, headers, policy, Action::Delete).await?;
    let statement = policy.delete(&caller, id, parent)?;

    let row = state.store.fetch_optional(&statement).await?.ok_or_else(|| not_found(policy))?;
    let message = match policy.delete_mode {
        DeleteMode::Hard => format!("{} deleted", policy.name),
        DeleteMode::Toggle(column) => match row.get(column).and_then(Value::as_bool) {
            Some(true) => format!("{} activated", policy.name),
            _ => format!("{} deactivated", policy.name),
        },
    };
    tracing::info!(resource = policy.name, user_id = %caller.user_id, %id, "{}", message);
    Ok(ApiResponse::success(row).with_message(message))
}
