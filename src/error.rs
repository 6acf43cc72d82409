//! Error types for the Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{repository::RepositoryError, validation::ValidationError};

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unexpected storage failure; `message` is what the client sees
    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("{message}: timed out after {after_secs}s")]
    StorageTimeout {
        message: &'static str,
        after_secs: u64,
    },
}

impl AppError {
    /// Category name reported in the `error` field of the response body
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Validation(ValidationError::MissingField(_)) => "MissingField",
            AppError::Validation(ValidationError::InvalidFormat(_)) => "InvalidFormat",
            AppError::Validation(ValidationError::InvalidRange(_)) => "InvalidRange",
            AppError::DuplicateKey(_) => "DuplicateKey",
            AppError::InvalidIdentifier(_) => "InvalidIdentifier",
            AppError::NotFound(_) => "NotFound",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Storage { .. } | AppError::StorageTimeout { .. } => "StorageError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateKey(_)
            | AppError::InvalidIdentifier(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage { .. } | AppError::StorageTimeout { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Storage { message, .. } | AppError::StorageTimeout { message, .. } => {
                message.to_string()
            }
            AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    /// Error category, e.g. `DuplicateKey`
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Storage error");
        }

        let body = Json(ErrorResponse {
            success: false,
            message: self.client_message(),
            error: self.category().to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
