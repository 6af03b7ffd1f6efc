//! Application error type and its HTTP representation.
//!
//! Every failure the shortener can surface to a caller is an [`AppError`].
//! Code collisions never reach this type: they are absorbed by the retry loop
//! in [`crate::application::services::ShortenerService`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload, also embedded in batch-style responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors returned by the shortener and the layers around it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input, rejected before any store interaction.
    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    /// No mapping exists for the requested short code.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Every candidate code collided; the code space is too crowded.
    #[error("Failed to allocate a unique short code after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    /// A store failure that is not a uniqueness collision.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status used when this error crosses the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ExhaustedRetries { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(StoreError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into the serializable payload.
    ///
    /// Storage details are not echoed back to clients; they are logged instead.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            AppError::InvalidInput { message, details } => ErrorInfo {
                code: "validation_error",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::NotFound { message, details } => ErrorInfo {
                code: "not_found",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::ExhaustedRetries { attempts } => ErrorInfo {
                code: "exhausted_retries",
                message: self.to_string(),
                details: json!({ "attempts": attempts }),
            },
            AppError::Storage(StoreError::Timeout) => ErrorInfo {
                code: "storage_timeout",
                message: "Storage did not respond in time".to_string(),
                details: json!({}),
            },
            AppError::Storage(_) => ErrorInfo {
                code: "storage_error",
                message: "Storage error".to_string(),
                details: json!({}),
            },
            AppError::Internal { message, details } => ErrorInfo {
                code: "internal_error",
                message: message.clone(),
                details: details.clone(),
            },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Request validation failed",
            serde_json::to_value(&errors).unwrap_or_default(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}
