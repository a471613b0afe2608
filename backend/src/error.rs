//! Error handling for the Retail Ops Platform
//!
//! Every failure leaves the API as the same envelope:
//! `{ "error": { "code", "message", "details" } }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use shared::{error_codes, ErrorBody, ErrorEnvelope, FieldError, WorkflowError};
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Workflow errors
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code of the error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => error_codes::VALIDATION,
            AppError::Conflict(_) => error_codes::CONFLICT,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::InvalidTransition(_) => error_codes::INVALID_TRANSITION,
            AppError::InsufficientStock { .. } => error_codes::INSUFFICIENT_STOCK,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) | AppError::InsufficientStock { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            AppError::Validation { field, message } => {
                (message.clone(), Some(json!({ "field": field })))
            }
            AppError::Conflict(msg) => (msg.clone(), None),
            AppError::NotFound(resource) => (format!("{} not found", resource), None),
            AppError::InvalidTransition(msg) => (msg.clone(), None),
            AppError::InsufficientStock {
                product_id,
                available,
                requested,
            } => (
                "Insufficient stock".to_string(),
                Some(json!({
                    "productId": product_id,
                    "available": available,
                    "requested": requested,
                })),
            ),
            AppError::DatabaseError(_) | AppError::MigrationError(_) => {
                ("A database error occurred".to_string(), None)
            }
            AppError::Internal(msg) => (msg.clone(), None),
            AppError::InternalError(_) => ("An internal server error occurred".to_string(), None),
        };

        ErrorBody {
            code: self.code().to_string(),
            message,
            details,
        }
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        FieldError::from(errors).into()
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(field) => field.into(),
            WorkflowError::InvalidTransition { .. } | WorkflowError::LegNotReady { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            WorkflowError::InsufficientQuantity {
                product_id,
                available,
                requested,
            } => AppError::InsufficientStock {
                product_id,
                available,
                requested,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!(code = %body.code, "Request rejected: {}", self);
        }

        (status, Json(ErrorEnvelope { error: body })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
