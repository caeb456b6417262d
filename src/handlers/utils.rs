use axum::{extract::rejection::JsonRejection, Json};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::canonical_uuid;

/// Validate an identifier taken from the path. Runs before any store access.
pub fn parse_id(name: &str, raw: &str) -> Result<Uuid, ApiError> {
    canonical_uuid(raw).ok_or_else(|| ApiError::validation(format!("{} is not a valid UUID", name)))
}

/// The request body as a JSON object
pub fn json_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::validation("request body must be a JSON object")),
        Err(rejection) => Err(ApiError::validation(rejection.body_text())),
    }
}

/// The request body decoded into `T`
pub fn json_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError> {
    let map = json_object(payload)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ApiError::validation(format!("invalid request body: {}", e)))
}
