use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

/// A row of `users` joined with its role name
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surnames: String,
    pub email: String,
    pub secret_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub role_id: Uuid,
    pub role_name: String,
}

/// Insert payload for a new account. The secret is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surnames: String,
    pub email: String,
    pub secret_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub role: Role,
}

/// Public view of an account; never carries the secret hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub surnames: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub role_id: Uuid,
    pub role_name: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            surnames: user.surnames,
            email: user.email,
            phone: user.phone,
            address: user.address,
            national_id: user.national_id,
            role_id: user.role_id,
            role_name: user.role_name,
        }
    }
}
