use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::{IssuedToken, PasswordService, TokenError, TokenService};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, Profile};
use crate::database::CredentialStore;
use crate::types::{Caller, Role};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("{field} {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("user not found")]
    UnknownUser,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { constraint } if constraint.contains("national_id") => {
                AuthError::Conflict("national id is already registered")
            }
            DatabaseError::UniqueViolation { .. } => AuthError::Conflict("email is already registered"),
            other => AuthError::Database(other),
        }
    }
}

/// Account details submitted on registration (camelCase on the wire)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: Option<String>,
    pub surnames: Option<String>,
    pub email: Option<String>,
    pub secret: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
}

/// Present and non-blank, trimmed
fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn bounded(field: &'static str, value: &str, max_len: usize) -> Result<String, AuthError> {
    if value.chars().count() > max_len {
        return Err(AuthError::InvalidField {
            field,
            reason: format!("must be at most {} characters", max_len),
        });
    }
    Ok(value.to_string())
}

fn optional(field: &'static str, value: &Option<String>, max_len: usize) -> Result<Option<String>, AuthError> {
    filled(value).map(|v| bounded(field, v, max_len)).transpose()
}

/// Trimmed, lowercased, with exactly one `@` between non-empty parts
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AuthError::InvalidField {
            field: "email",
            reason: "is not a valid address".to_string(),
        });
    }
    bounded("email", &email, 128)
}

/// Registers accounts and exchanges credentials for session tokens
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    tokens: TokenService,
}

impl Authenticator {
    pub fn new(credentials: Arc<dyn CredentialStore>, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            credentials,
            passwords,
            tokens,
        }
    }

    /// Token service used to sign session tokens
    #[cfg(test)]
    pub(crate) fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create an account with `role` and return its id
    pub async fn register(&self, registration: Registration, role: Role) -> Result<Uuid, AuthError> {
        let required = [
            ("name", &registration.name),
            ("surnames", &registration.surnames),
            ("email", &registration.email),
            ("secret", &registration.secret),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| filled(value).is_none())
            .map(|(field, _)| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::MissingFields(missing));
        }

        let (name, surnames, email, secret) = match (
            filled(&registration.name),
            filled(&registration.surnames),
            filled(&registration.email),
            registration.secret.as_deref(),
        ) {
            (Some(name), Some(surnames), Some(email), Some(secret)) => (name, surnames, email, secret),
            _ => return Err(AuthError::MissingFields(vec![])),
        };

        let user = NewUser {
            name: bounded("name", name, 256)?,
            surnames: bounded("surnames", surnames, 256)?,
            email: normalize_email(email)?,
            secret_hash: self.passwords.hash_password(secret).await.map_err(AuthError::Hashing)?,
            phone: optional("phone", &registration.phone, 20)?,
            address: optional("address", &registration.address, 512)?,
            national_id: optional("nationalId", &registration.national_id, 24)?,
            role,
        };
        let email = user.email.clone();

        let id = self.credentials.insert_user(user).await?;
        tracing::info!(user_id = %id, %email, %role, "registered account");
        Ok(id)
    }

    /// Exchange email and secret for a session token. Unknown email and
    /// wrong secret fail identically.
    pub async fn login(&self, email: Option<&str>, secret: Option<&str>) -> Result<IssuedToken, AuthError> {
        let (email, secret) = match (email.map(str::trim).filter(|e| !e.is_empty()), secret.filter(|s| !s.is_empty())) {
            (Some(email), Some(secret)) => (email.to_lowercase(), secret),
            (email, secret) => {
                let mut missing = vec![];
                if email.is_none() {
                    missing.push("email".to_string());
                }
                if secret.is_none() {
                    missing.push("secret".to_string());
                }
                return Err(AuthError::MissingFields(missing));
            }
        };

        let user = match self.credentials.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(%email, "login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = self
            .passwords
            .verify_password(secret, &user.secret_hash)
            .await
            .map_err(AuthError::Hashing)?;
        if !matches {
            tracing::warn!(user_id = %user.id, "login with wrong secret");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(issued)
    }

    pub async fn whoami(&self, caller: &Caller) -> Result<Profile, AuthError> {
        self.credentials
            .find_by_id(caller.user_id)
            .await?
            .map(Profile::from)
            .ok_or(AuthError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCredentialStore;

    fn authenticator() -> (Authenticator, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::default());
        let auth = Authenticator::new(
            store.clone(),
            PasswordService::new(4),
            TokenService::new("test-secret", 3600),
        );
        (auth, store)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: Some("Lucia".into()),
            surnames: Some("Vargas Mora".into()),
            email: Some(email.into()),
            secret: Some("correct horse".into()),
            national_id: Some("1-2345-6789".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let (auth, store) = authenticator();
        let id = auth.register(registration("Lucia@Example.com "), Role::Client).await.unwrap();

        let stored = store.user(id).unwrap();
        assert_eq!(stored.email, "lucia@example.com");
        assert_ne!(stored.secret_hash, "correct horse");
        assert_eq!(stored.role_name, "Client");

        let issued = auth.login(Some("lucia@example.com"), Some("correct horse")).await.unwrap();
        let claims = TokenService::new("test-secret", 3600).verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, id);
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_email_fail_alike() {
        let (auth, _) = authenticator();
        auth.register(registration("a@b.co"), Role::Client).await.unwrap();

        for secret in ["correct horsE", "correct horse ", "x"] {
            let err = auth.login(Some("a@b.co"), Some(secret)).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{}", secret);
        }
        let err = auth.login(Some("nobody@b.co"), Some("correct horse")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_reports_missing_fields() {
        let (auth, _) = authenticator();
        let reg = Registration {
            name: Some("  ".into()),
            email: Some("a@b.co".into()),
            ..Default::default()
        };
        match auth.register(reg, Role::Client).await.unwrap_err() {
            AuthError::MissingFields(fields) => assert_eq!(fields, vec!["name", "surnames", "secret"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let (auth, _) = authenticator();
        for email in ["plain", "@b.co", "a@", "a@b@c", "a b@c.d"] {
            let err = auth.register(registration(email), Role::Client).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidField { field: "email", .. }), "{}", email);
        }
    }

    #[tokio::test]
    async fn duplicate_email_and_national_id_conflict() {
        let (auth, _) = authenticator();
        auth.register(registration("a@b.co"), Role::Client).await.unwrap();

        let mut dup_email = registration("A@B.CO");
        dup_email.national_id = None;
        let err = auth.register(dup_email, Role::Client).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict("email is already registered")));

        let err = auth.register(registration("other@b.co"), Role::Client).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict("national id is already registered")));
    }

    #[tokio::test]
    async fn whoami_returns_profile_without_secret() {
        let (auth, _) = authenticator();
        let id = auth.register(registration("a@b.co"), Role::Administrator).await.unwrap();
        let caller = Caller { user_id: id, role: Role::Administrator };

        let profile = auth.whoami(&caller).await.unwrap();
        assert_eq!(profile.role_name, "Administrator");
        let body = serde_json::to_value(&profile).unwrap();
        assert!(body.get("secretHash").is_none());
        assert_eq!(body["nationalId"], "1-2345-6789");

        let ghost = Caller { user_id: Uuid::new_v4(), role: Role::Client };
        assert!(matches!(auth.whoami(&ghost).await, Err(AuthError::UnknownUser)));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (auth, _) = authenticator();
        match auth.login(None, Some("")).await.unwrap_err() {
            AuthError::MissingFields(fields) => assert_eq!(fields, vec!["email", "secret"]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
