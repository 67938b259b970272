//! HTTP handlers for the server.

pub mod compile;
pub mod kinds;

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use super::state::AppState;

/// Handle GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "listen": state.config.listen_addr,
        "startedAt": state.started_at,
    }))
}
