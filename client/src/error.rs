//! Client-side error taxonomy

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use shared::{error_codes, ErrorEnvelope, FieldError};
use thiserror::Error;
use uuid::Uuid;

/// Code used when a failed response carries no error envelope
pub const UNKNOWN_CODE: &str = "UNKNOWN";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("{code} ({status}): {message}")]
    Http {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },

    /// The request never got an answer
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx body that does not match the expected shape
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// Rejected locally, before any request was sent
    #[error("Validation error on {}: {}", .0.field, .0.message)]
    Validation(#[from] FieldError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Details of an INSUFFICIENT_STOCK rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientStock {
    pub product_id: Uuid,
    pub available: Decimal,
    pub requested: Decimal,
}

impl ApiError {
    /// Decode a non-2xx response body
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ApiError::Http {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
            },
            Err(_) => ApiError::Http {
                status,
                code: UNKNOWN_CODE.to_string(),
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                },
                details: None,
            },
        }
    }

    /// Machine-readable code; local failures map onto the server codes
    pub fn code(&self) -> &str {
        match self {
            ApiError::Http { code, .. } => code,
            ApiError::Network(_) => "NETWORK",
            ApiError::Decode(_) => UNKNOWN_CODE,
            ApiError::Validation(_) => error_codes::VALIDATION,
        }
    }

    pub fn is_invalid_transition(&self) -> bool {
        self.code() == error_codes::INVALID_TRANSITION
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == error_codes::NOT_FOUND
    }

    /// Stock figures of an INSUFFICIENT_STOCK rejection
    pub fn insufficient_stock(&self) -> Option<InsufficientStock> {
        match self {
            ApiError::Http {
                code,
                details: Some(details),
                ..
            } if code == error_codes::INSUFFICIENT_STOCK => {
                serde_json::from_value(details.clone()).ok()
            }
            _ => None,
        }
    }

    /// Field a validation failure points at, local or remote
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::Validation(err) => Some(&err.field),
            ApiError::Http {
                code,
                details: Some(details),
                ..
            } if code == error_codes::VALIDATION => details.get("field").and_then(Value::as_str),
            _ => None,
        }
    }
}
