use axum::{extract::State, http::HeaderMap};

use crate::app::AppState;
use crate::database::models::Profile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

/// GET /auth/whoami - profile of the token holder
pub async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Profile> {
    let caller = state.guard.authorize(&headers, Role::ALL).await?;
    let profile = state.authenticator.whoami(&caller).await?;
    Ok(ApiResponse::success(profile))
}
