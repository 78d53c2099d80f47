use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::state::AppState;

/// Liveness check that never touches the database.
async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// Database health report. Always 200; a dead backend shows up as
/// `"status": "down"` inside the report.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let report = state.store.health_check().await;

    tracing::debug!(
        status = report.get("status").map(String::as_str).unwrap_or_default(),
        "Health check completed"
    );

    Json(json!({ "healthy": report }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health_check))
}
