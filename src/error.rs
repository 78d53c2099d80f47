use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure to read connection settings at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error loading .env file: {0}")]
    EnvFile(dotenvy::Error),

    #[error("Configuration error: {0}")]
    Source(#[from] ::config::ConfigError),
}

/// Failure inside the data-access layer.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid connection parameters: {0}")]
    PoolOpen(String),

    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Failure constructing the shared product service.
#[derive(Error, Debug)]
pub enum ServiceInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors surfaced by HTTP handlers.
///
/// Data errors are logged server-side; the client only ever sees the generic
/// message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request")]
    BadRequest,

    #[error(transparent)]
    Data(#[from] DataError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::Data(e) => {
                tracing::error!(error = %e, "Data access failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
