use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Authenticator, PasswordService, TokenService};
use crate::config::AppConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};
use crate::database::{CredentialStore, ResourceStore, Row, Statement};
use crate::middleware::Guard;
use crate::types::Role;

pub const TEST_SECRET: &str = "test-secret";

/// Credential store kept in memory, enforcing the same unique keys as `users`
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Vec<User>>,
}

impl MemoryCredentialStore {
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    /// Insert an account directly, bypassing hashing
    pub fn seed(&self, email: &str, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().push(User {
            id,
            name: "Test".into(),
            surnames: "User".into(),
            email: email.into(),
            secret_hash: String::new(),
            phone: None,
            address: None,
            national_id: None,
            role_id: role.id(),
            role_name: role.as_str().into(),
        });
        id
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_user(&self, user: NewUser) -> Result<Uuid, DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "users_email_key".into(),
            });
        }
        if user.national_id.is_some() && users.iter().any(|u| u.national_id == user.national_id) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "users_national_id_key".into(),
            });
        }

        let id = Uuid::new_v4();
        users.push(User {
            id,
            name: user.name,
            surnames: user.surnames,
            email: user.email,
            secret_hash: user.secret_hash,
            phone: user.phone,
            address: user.address,
            national_id: user.national_id,
            role_id: user.role.id(),
            role_name: user.role.as_str().into(),
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.user(id))
    }

    async fn role_of(&self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        Ok(self.user(id).and_then(|u| Role::from_id(u.role_id)))
    }
}

/// Resource store that records every statement and answers from a script.
/// With the script exhausted it answers with no rows.
#[derive(Default)]
pub struct RecordingStore {
    replies: Mutex<VecDeque<Result<Vec<Row>, DatabaseError>>>,
    statements: Mutex<Vec<Statement>>,
    down: bool,
}

impl RecordingStore {
    pub fn unavailable() -> Self {
        Self {
            down: true,
            ..Default::default()
        }
    }

    /// Queue a reply; each value must be a JSON object
    pub fn reply(self, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("scripted row must be an object, got {}", other),
            })
            .collect();
        self.replies.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn fail(self, err: DatabaseError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceStore for RecordingStore {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        self.statements.lock().unwrap().push(statement.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.down {
            return Err(DatabaseError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

/// Application state wired to in-memory fakes
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<RecordingStore>,
    pub credentials: Arc<MemoryCredentialStore>,
}

impl TestApp {
    pub fn new(store: RecordingStore) -> Self {
        Self::with_config(store, AppConfig::development())
    }

    pub fn with_config(store: RecordingStore, mut config: AppConfig) -> Self {
        config.security.jwt_secret = TEST_SECRET.into();
        config.security.bcrypt_cost = 4;

        let store = Arc::new(store);
        let credentials = Arc::new(MemoryCredentialStore::default());
        let tokens = TokenService::from_config(&config.security);
        let authenticator = Authenticator::new(
            credentials.clone(),
            PasswordService::new(config.security.bcrypt_cost),
            tokens.clone(),
        );
        let guard = Guard::new(tokens, credentials.clone());

        let state = AppState::new(config, store.clone(), authenticator, guard);
        Self {
            state,
            store,
            credentials,
        }
    }

    /// Seed an account and return a bearer header value for it
    pub fn login_as(&self, role: Role) -> (Uuid, String) {
        let id = self.credentials.seed(&format!("{}@test.local", Uuid::new_v4()), role);
        let issued = self
            .state
            .authenticator
            .tokens()
            .issue(id)
            .expect("token issue");
        (id, format!("Bearer {}", issued.token))
    }
}
