// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::auth::IssuedToken;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub secret: Option<String>,
}

/**
 * POST /auth/login - Authenticate and receive a session token
 *
 * Input: `{ "email": "string", "secret": "string" }`
 *
 * Output: `{ "success": true, "message": "...", "data": { "token": "...", "expiresIn": 3600 } }`
 *
 * An unknown email and a wrong secret both answer 404 "invalid credentials".
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<IssuedToken> {
    let request: LoginRequest = json_body(payload)?;
    let issued = state
        .authenticator
        .login(request.email.as_deref(), request.secret.as_deref())
        .await?;

    Ok(ApiResponse::success(issued).with_message("login successful"))
}
