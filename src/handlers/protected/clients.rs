use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::resource;
use crate::app::AppState;
use crate::auth::Registration;
use crate::database::Row;
use crate::error::ApiError;
use crate::handlers::utils::{json_body, parse_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::{Selector, CLIENTS};
use crate::types::{canonical_uuid, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    #[serde(flatten)]
    pub registration: Registration,
    /// Role name, e.g. "Administrator"
    pub role: Option<String>,
    /// Seeded id of a role; used when `role` is absent
    pub role_id: Option<String>,
}

impl ClientRequest {
    fn requested_role(&self) -> Result<Role, ApiError> {
        match (self.role.as_deref().map(str::trim), self.role_id.as_deref()) {
            (Some(name), _) if !name.is_empty() => name.parse::<Role>().map_err(|e| ApiError::validation(e.to_string())),
            (_, Some(id)) => canonical_uuid(id)
                .and_then(Role::from_id)
                .ok_or_else(|| ApiError::validation("roleId does not name a known role")),
            _ => Ok(Role::Client),
        }
    }
}

/// POST /clients - create an account, optionally with a role. Assigning a
/// staff role needs a staff caller; SuperUser only a SuperUser may grant.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    if state.config.security.guard_client_routes {
        state.guard.authorize(&headers, Role::STAFF).await?;
    }

    let request: ClientRequest = json_body(payload)?;
    let role = request.requested_role()?;
    match role {
        Role::Client => {}
        Role::Administrator => {
            state.guard.authorize(&headers, Role::STAFF).await?;
        }
        Role::SuperUser => {
            state.guard.authorize(&headers, &[Role::SuperUser]).await?;
        }
    }

    let id = state.authenticator.register(request.registration, role).await?;
    Ok(ApiResponse::created(json!({ "clientId": id })).with_message("client created"))
}

/// GET /clients
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Row>> {
    if state.config.security.guard_client_routes {
        state.guard.authorize(&headers, Role::STAFF).await?;
    }
    resource::list(&state, &headers, &CLIENTS, Selector::all()).await
}

/// GET /clients/:clientId - a client can only read itself
pub async fn get(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Row> {
    let client_id = parse_id("clientId", &client_id)?;
    resource::fetch(&state, &headers, &CLIENTS, Selector::by_id(client_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Option<&str>, role_id: Option<&str>) -> ClientRequest {
        ClientRequest {
            registration: Registration::default(),
            role: role.map(String::from),
            role_id: role_id.map(String::from),
        }
    }

    #[test]
    fn role_defaults_to_client() {
        assert_eq!(request(None, None).requested_role().unwrap(), Role::Client);
        assert_eq!(request(Some(" "), None).requested_role().unwrap(), Role::Client);
    }

    #[test]
    fn role_by_name_or_seeded_id() {
        assert_eq!(request(Some("Administrador"), None).requested_role().unwrap(), Role::Administrator);
        let id = Role::SuperUser.id().to_string();
        assert_eq!(request(None, Some(&id)).requested_role().unwrap(), Role::SuperUser);
        assert!(request(Some("root"), None).requested_role().is_err());
        assert!(request(None, Some("00000000-0000-0000-0000-000000000000")).requested_role().is_err());
    }

    #[test]
    fn camel_case_body_with_flattened_registration() {
        let body: ClientRequest = serde_json::from_value(json!({
            "name": "Ana",
            "nationalId": "9-999",
            "roleId": "6c8a2a6e-6df4-4fa7-8cb8-1757d68345d8"
        }))
        .unwrap();
        assert_eq!(body.registration.national_id.as_deref(), Some("9-999"));
        assert_eq!(body.requested_role().unwrap(), Role::Administrator);
    }
}
