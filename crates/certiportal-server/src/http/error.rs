//! API error taxonomy and HTTP response mapping.
//!
//! Every error surfaces to the caller as `{"error": "<human-readable>"}`.
//! Storage and internal failures are logged with detail but answered with a
//! generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use certiportal_core::db::DatabaseError;

use crate::blob::BlobError;
use crate::lifecycle::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer credential (401).
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but insufficient role or ownership (403).
    #[error("{0}")]
    Authorization(String),

    /// Referenced entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// HTTP method not supported on this route (405).
    #[error("Método no permitido")]
    MethodNotAllowed,

    /// Duplicate resource (409).
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure (500).
    #[error("Error interno del servidor")]
    Database(#[source] DatabaseError),

    /// Anything else that should not leak detail to the caller (500).
    #[error("Error interno del servidor")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(_) => Self::NotFound("Recurso no encontrado".to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<BlobError> for ApiError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::TooLarge(_) => {
                Self::Validation("El archivo supera el tamaño máximo de 10 MiB".to_string())
            }
            BlobError::InvalidKey(key) => Self::Validation(format!("Nombre de archivo inválido: {key}")),
            BlobError::Io(io) => Self::Internal(io.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => error!(error = %e, "Database failure"),
            ApiError::Internal(detail) => error!(detail, "Internal failure"),
            _ => {}
        }

        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
