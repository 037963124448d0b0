//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Input shape errors
    #[error("{0}")]
    SchemaError(String),

    #[error("{0}")]
    DataError(String),

    #[error("No rows to evaluate")]
    EmptyInputError,

    // Registry errors
    #[error("Unknown model_id: {0}")]
    UnknownModelError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    // Request validation errors
    #[error("{0}")]
    ValidationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Stable error classification reported to clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::SchemaError(_) => "schema_error",
            AppError::DataError(_) => "data_error",
            AppError::EmptyInputError => "empty_input",
            AppError::UnknownModelError(_) => "unknown_model",
            AppError::ManifestError(_) => "manifest_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::InternalError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ManifestError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::ManifestError(msg) => {
                tracing::error!("Manifest error: {}", msg);
                "Model registry misconfigured".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!("Request rejected ({}): {}", other.kind(), other);
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => AppError::DataError(format!("CSV parse error at line {}: {}", pos.line(), err)),
            None => AppError::DataError(format!("CSV parse error: {}", err)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::DataError(format!("Read failure: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ManifestError(err.to_string())
    }
}
