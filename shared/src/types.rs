//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Default page size of list endpoints
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 200;

/// Clamp a requested list size into `1..=MAX_LIMIT`
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// List response envelope: `{ "items": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

impl<T> ItemsResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Single-item response envelope: `{ "item": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub item: T,
}

impl<T> ItemResponse<T> {
    pub fn new(item: T) -> Self {
        Self { item }
    }
}

/// Error envelope: `{ "error": { "code", "message", "details" } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Body of the error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Machine-readable error codes of the API
pub mod error_codes {
    pub const VALIDATION: &str = "VALIDATION";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const INSUFFICIENT_STOCK: &str = "INSUFFICIENT_STOCK";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Active/inactive filter of directory listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl StatusFilter {
    /// `Some(is_active)` to filter on, `None` for all rows
    pub fn is_active(&self) -> Option<bool> {
        match self {
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
            StatusFilter::All => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(20)), 20);
    }

    #[test]
    fn test_error_envelope_shape() {
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: error_codes::NOT_FOUND.to_string(),
                message: "Transfer not found".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"].get("details").is_none());
    }
}
