//! Request handlers, one module per resource.

pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod transactions;
pub mod users;
pub mod webhooks;

use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Parses a request body that must be a JSON object.
pub(crate) fn json_object(body: &Bytes, message: &str) -> ApiResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::bad_request(message)),
    }
}

/// Like [`json_object`], but an empty body (or `{}`) is an empty map.
pub(crate) fn optional_json_object(body: &Bytes, message: &str) -> ApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::bad_request(message)),
    }
}

/// Trimmed, non-empty string field.
pub(crate) fn text_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
