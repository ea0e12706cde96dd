use std::sync::Arc;

use apollo_core::Provider;
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "provider": match state.config.provider {
            Provider::Local => "local",
            Provider::CloudRun => "cloudrun",
        },
        "store": state.store.is_some(),
        "schedules": state
            .scheduler
            .as_ref()
            .map(|s| s.names().len())
            .unwrap_or(0),
    }))
}
