// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Registration;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

/**
 * POST /auth/register - Self-service registration
 *
 * Input: `{ name, surnames, email, secret, phone?, address?, nationalId? }`
 *
 * Accounts created here are always Clients; any role in the body is ignored.
 */
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let registration: Registration = json_body(payload)?;
    let id = state.authenticator.register(registration, Role::Client).await?;

    Ok(ApiResponse::created(json!({ "id": id })).with_message("account registered"))
}
