// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::auth::{AuthError, TokenError};
use crate::database::manager::DatabaseError;
use crate::policy::PolicyError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 on purpose: login does not reveal whether the email exists
    InvalidCredentials,

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // 500 Internal Server Error
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::InvalidCredentials => "invalid credentials",
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Internal { message, .. } => message,
        }
    }

    /// Error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body. Raw internal detail is only attached
    /// in debug builds.
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code(),
        });

        match self {
            ApiError::Validation {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::Internal {
                detail: Some(detail),
                ..
            } if cfg!(debug_assertions) => {
                response["error"] = json!(detail);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn validation_fields(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { constraint } => {
                if constraint.contains("email") {
                    ApiError::conflict("email is already registered")
                } else if constraint.contains("national_id") {
                    ApiError::conflict("national id is already registered")
                } else if constraint.contains("enrollments") {
                    ApiError::conflict("athlete is already enrolled in this tournament")
                } else {
                    ApiError::conflict("record already exists")
                }
            }
            DatabaseError::ForeignKeyViolation { constraint } => {
                tracing::debug!("Foreign key violation on {}", constraint);
                ApiError::validation("referenced record does not exist")
            }
            DatabaseError::CheckViolation { constraint } => {
                ApiError::validation(format!("value violates constraint {}", constraint))
            }
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
            }
            other => {
                // Log the real error, return a generic message
                tracing::error!("Database error: {}", other);
                ApiError::internal("An error occurred while processing your request", other)
            }
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Forbidden { .. } | PolicyError::NotOwner(_) => {
                ApiError::forbidden(err.to_string())
            }
            PolicyError::NoWritableFields => ApiError::validation(err.to_string()),
            PolicyError::FieldsNotWritable(ref fields) => {
                let field_errors = fields
                    .iter()
                    .map(|f| (f.clone(), "not writable for role".to_string()))
                    .collect();
                ApiError::validation_fields(err.to_string(), field_errors)
            }
            PolicyError::MissingFields(fields) => {
                let field_errors = fields
                    .into_iter()
                    .map(|f| (f, "This field is required".to_string()))
                    .collect();
                ApiError::validation_fields("Missing required fields", field_errors)
            }
            PolicyError::InvalidFields(field_errors) => {
                ApiError::validation_fields("Invalid field format", field_errors.into_iter().collect())
            }
            PolicyError::Statement(e) => {
                tracing::error!("Policy statement error: {}", e);
                ApiError::internal("An error occurred while processing your request", e)
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(reason) => {
                tracing::debug!("Token rejected: {}", reason);
                ApiError::unauthorized("invalid token")
            }
            TokenError::MissingSecret | TokenError::Generation(_) => {
                tracing::error!("Token service error: {}", err);
                ApiError::internal("Failed to issue session token", err)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields(fields) => {
                let field_errors = fields
                    .into_iter()
                    .map(|f| (f, "This field is required".to_string()))
                    .collect();
                ApiError::validation_fields("Missing required fields", field_errors)
            }
            AuthError::InvalidField { field, ref reason } => {
                let mut field_errors = BTreeMap::new();
                field_errors.insert(field.to_string(), reason.clone());
                ApiError::validation_fields(err.to_string(), field_errors)
            }
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Conflict(msg) => ApiError::conflict(msg),
            AuthError::UnknownUser => ApiError::not_found("user not found"),
            AuthError::Hashing(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                ApiError::internal("An error occurred while processing your request", msg)
            }
            AuthError::Token(e) => e.into(),
            AuthError::Database(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
