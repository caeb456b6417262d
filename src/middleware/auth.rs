use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::auth::TokenService;
use crate::database::CredentialStore;
use crate::error::ApiError;
use crate::types::{Caller, Role};

/// Resolves who is calling before a protected operation runs: bearer token
/// first, then the caller's current role from the credential store.
#[derive(Clone)]
pub struct Guard {
    tokens: TokenService,
    credentials: Arc<dyn CredentialStore>,
}

impl Guard {
    pub fn new(tokens: TokenService, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, credentials }
    }

    /// Admit the caller when its role is in `allowed`
    pub async fn authorize(&self, headers: &HeaderMap, allowed: &[Role]) -> Result<Caller, ApiError> {
        let token = extract_jwt_from_headers(headers).ok_or_else(|| ApiError::unauthorized("missing token"))?;

        let claims = self.tokens.verify(token)?;

        let role = self
            .credentials
            .role_of(claims.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        if !allowed.contains(&role) {
            tracing::debug!(user_id = %claims.user_id, %role, "role not allowed");
            return Err(ApiError::forbidden(format!("role {} is not allowed here", role)));
        }

        Ok(Caller {
            user_id: claims.user_id,
            role,
        })
    }
}

/// Bearer token from the Authorization header, if there is a usable one
fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryCredentialStore, TEST_SECRET};
    use axum::http::{HeaderValue, StatusCode};
    use uuid::Uuid;

    fn guard() -> (Guard, Arc<MemoryCredentialStore>, TokenService) {
        let store = Arc::new(MemoryCredentialStore::default());
        let tokens = TokenService::new(TEST_SECRET, 3600);
        (Guard::new(tokens.clone(), store.clone()), store, tokens)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        headers
    }

    #[tokio::test]
    async fn admits_allowed_role() {
        let (guard, store, tokens) = guard();
        let id = store.seed("admin@club.test", Role::Administrator);
        let token = tokens.issue(id).unwrap().token;

        let caller = guard.authorize(&bearer(&token), Role::STAFF).await.unwrap();
        assert_eq!(caller, Caller { user_id: id, role: Role::Administrator });
    }

    #[tokio::test]
    async fn missing_and_invalid_tokens_are_unauthorized() {
        let (guard, _, _) = guard();

        let err = guard.authorize(&HeaderMap::new(), Role::ALL).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "missing token");

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        let err = guard.authorize(&basic, Role::ALL).await.unwrap_err();
        assert_eq!(err.message(), "missing token");

        let forged = TokenService::new("other", 3600).issue(Uuid::new_v4()).unwrap().token;
        let err = guard.authorize(&bearer(&forged), Role::ALL).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "invalid token");
    }

    #[tokio::test]
    async fn deleted_user_is_not_found() {
        let (guard, _, tokens) = guard();
        let token = tokens.issue(Uuid::new_v4()).unwrap().token;
        let err = guard.authorize(&bearer(&token), Role::ALL).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn role_outside_allowed_set_is_forbidden() {
        let (guard, store, tokens) = guard();
        let id = store.seed("client@club.test", Role::Client);
        let token = tokens.issue(id).unwrap().token;
        let err = guard.authorize(&bearer(&token), Role::STAFF).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
