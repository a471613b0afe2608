//! Delivery trip models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Status of a delivery trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Planned,
    InProgress,
    Done,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Done => "DONE",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(TripStatus::Planned),
            "IN_PROGRESS" => Some(TripStatus::InProgress),
            "DONE" => Some(TripStatus::Done),
            "CANCELLED" => Some(TripStatus::Cancelled),
            _ => None,
        }
    }
}

/// A delivery trip leaving a warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub status: TripStatus,
    pub from_warehouse_id: Uuid,
    pub from_warehouse_name: String,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for planning a trip
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripInput {
    pub from_warehouse_id: Uuid,
    pub driver_id: Uuid,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Identifier returned after creation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatedId {
    pub id: Uuid,
}
