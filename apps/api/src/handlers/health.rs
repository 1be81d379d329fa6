use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

/// Liveness check, with a database round-trip.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = if state.db.health_check().await {
        "ok"
    } else {
        "unavailable"
    };
    Json(json!({"status": "ok", "database": database}))
}
