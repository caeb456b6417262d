use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};
use crate::types::Role;

/// Persistence for accounts: identity, hashed secret and role reference
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user and return its id. Duplicate email or national id
    /// surfaces as `DatabaseError::UniqueViolation`.
    async fn insert_user(&self, user: NewUser) -> Result<Uuid, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Current role of a user, `None` when the user no longer exists
    async fn role_of(&self, id: Uuid) -> Result<Option<Role>, DatabaseError>;
}

const USER_COLUMNS: &str = "u.id, u.name, u.surnames, u.email, u.secret_hash, u.phone, u.address, \
     u.national_id, u.role_id, r.name AS role_name";

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_user(&self, user: NewUser) -> Result<Uuid, DatabaseError> {
        let id: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO users (name, surnames, email, secret_hash, phone, address, national_id, role_id)
             SELECT $1, $2, $3, $4, $5, $6, $7, r.id FROM roles r WHERE r.name = $8
             RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.surnames)
        .bind(&user.email)
        .bind(&user.secret_hash)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.national_id)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        id.map(|(id,)| id).ok_or_else(|| {
            DatabaseError::QueryError(format!("role '{}' is not present in roles", user.role))
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn role_of(&self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        let name: Option<(String,)> = sqlx::query_as(
            "SELECT r.name FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match name {
            None => Ok(None),
            Some((name,)) => name
                .parse::<Role>()
                .map(Some)
                .map_err(|e| DatabaseError::QueryError(e.to_string())),
        }
    }
}
