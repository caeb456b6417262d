pub mod credentials;
pub mod manager;
pub mod models;
pub mod statement;
pub mod store;

pub use credentials::{CredentialStore, PgCredentialStore};
pub use manager::{DatabaseError, DatabaseManager};
pub use statement::{Statement, StatementBuilder, StatementError};
pub use store::{PgStore, ResourceStore, Row};
