//! `/health` and `/metrics` handlers.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::handler::AppState;
use crate::metrics::MetricsSnapshot;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.metrics())
}
