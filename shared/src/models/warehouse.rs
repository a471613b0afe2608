//! Warehouse and store directory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Code of the reserved system warehouse used as the intermediate hop of a journey
pub const TRANSIT_CODE: &str = "TRANSIT";

/// Kind of stock location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseKind {
    Depot,
    Store,
}

impl WarehouseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseKind::Depot => "DEPOT",
            WarehouseKind::Store => "STORE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DEPOT" => Some(WarehouseKind::Depot),
            "STORE" => Some(WarehouseKind::Store),
            _ => None,
        }
    }
}

impl std::fmt::Display for WarehouseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseKind::Depot => write!(f, "Depot"),
            WarehouseKind::Store => write!(f, "Store"),
        }
    }
}

/// A stock location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: WarehouseKind,
    pub is_active: bool,
    /// True only for the reserved TRANSIT location
    pub is_system: bool,
    pub price_list_id: Option<Uuid>,
}

impl Warehouse {
    pub fn to_ref(&self) -> WarehouseRef {
        WarehouseRef {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            kind: self.kind,
            is_system: self.is_system,
        }
    }
}

/// Warehouse summary embedded in transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRef {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: WarehouseKind,
    pub is_system: bool,
}

impl WarehouseRef {
    pub fn is_transit(&self) -> bool {
        self.is_system && self.code == TRANSIT_CODE
    }
}

/// A physical store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub price_list_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Compact store row for pickers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMini {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

/// Input for creating a store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreInput {
    #[validate(length(min = 2, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
