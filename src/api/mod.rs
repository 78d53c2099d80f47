// API module - HTTP endpoints

use axum::{error_handling::HandleErrorLayer, http::StatusCode, BoxError, Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod products;
pub mod state;

#[cfg(test)]
pub(crate) mod mock;

pub use state::AppState;

/// Per-request deadline covering body read and response write.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    app_with_timeout(state, REQUEST_TIMEOUT)
}

pub fn app_with_timeout(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Keeps middleware failures in the same `{"message": ...}` envelope as
/// handler errors.
async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "message": "Request Timeout" })),
        )
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Internal Server Error" })),
        )
    }
}
