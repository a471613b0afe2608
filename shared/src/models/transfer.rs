//! Stock transfer models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::WarehouseRef;

/// Lifecycle status of a stock transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Draft,
    Shipped,
    PartiallyReceived,
    Received,
    Cancelled,
    Disputed,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 6] = [
        TransferStatus::Draft,
        TransferStatus::Shipped,
        TransferStatus::PartiallyReceived,
        TransferStatus::Received,
        TransferStatus::Cancelled,
        TransferStatus::Disputed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Draft => "DRAFT",
            TransferStatus::Shipped => "SHIPPED",
            TransferStatus::PartiallyReceived => "PARTIALLY_RECEIVED",
            TransferStatus::Received => "RECEIVED",
            TransferStatus::Cancelled => "CANCELLED",
            TransferStatus::Disputed => "DISPUTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(TransferStatus::Draft),
            "SHIPPED" => Some(TransferStatus::Shipped),
            "PARTIALLY_RECEIVED" => Some(TransferStatus::PartiallyReceived),
            "RECEIVED" => Some(TransferStatus::Received),
            "CANCELLED" => Some(TransferStatus::Cancelled),
            "DISPUTED" => Some(TransferStatus::Disputed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Draft => write!(f, "Draft"),
            TransferStatus::Shipped => write!(f, "Shipped"),
            TransferStatus::PartiallyReceived => write!(f, "Partially received"),
            TransferStatus::Received => write!(f, "Received"),
            TransferStatus::Cancelled => write!(f, "Cancelled"),
            TransferStatus::Disputed => write!(f, "Disputed"),
        }
    }
}

/// Business reason for moving stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferPurpose {
    StoreReplenish,
    Rebalance,
    InternalDelivery,
    Other,
}

impl TransferPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPurpose::StoreReplenish => "STORE_REPLENISH",
            TransferPurpose::Rebalance => "REBALANCE",
            TransferPurpose::InternalDelivery => "INTERNAL_DELIVERY",
            TransferPurpose::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "STORE_REPLENISH" => Some(TransferPurpose::StoreReplenish),
            "REBALANCE" => Some(TransferPurpose::Rebalance),
            "INTERNAL_DELIVERY" => Some(TransferPurpose::InternalDelivery),
            "OTHER" => Some(TransferPurpose::Other),
            _ => None,
        }
    }

    /// Purposes delivered by truck go through the TRANSIT hop
    pub fn requires_transit(&self) -> bool {
        matches!(
            self,
            TransferPurpose::StoreReplenish | TransferPurpose::InternalDelivery
        )
    }
}

/// One product line of a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransferLine {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Requested quantity
    pub qty: Decimal,
    /// Cumulative quantity received so far
    pub qty_received: Decimal,
    pub note: Option<String>,
}

impl StockTransferLine {
    pub fn remaining(&self) -> Decimal {
        (self.qty - self.qty_received).max(Decimal::ZERO)
    }

    pub fn is_complete(&self) -> bool {
        self.qty_received >= self.qty
    }
}

/// A movement of product quantities between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransfer {
    pub id: Uuid,
    pub status: TransferStatus,
    pub purpose: Option<TransferPurpose>,
    pub from_warehouse: WarehouseRef,
    pub to_warehouse: WarehouseRef,
    /// Shared by the legs of one journey through TRANSIT
    pub journey_id: Option<Uuid>,
    pub note: Option<String>,
    pub dispute_reason: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<StockTransferLine>,
}

impl StockTransfer {
    pub fn is_fully_received(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(StockTransferLine::is_complete)
    }

    pub fn line_for_product(&self, product_id: Uuid) -> Option<&StockTransferLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// First leg of a journey ends at TRANSIT
    pub fn is_first_leg(&self) -> bool {
        self.journey_id.is_some() && self.to_warehouse.is_transit()
    }

    /// Second leg of a journey starts at TRANSIT
    pub fn is_second_leg(&self) -> bool {
        self.journey_id.is_some() && self.from_warehouse.is_transit()
    }
}

/// Line requested by an operator
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferLineInput {
    pub product_id: Uuid,
    pub qty: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Input for creating a transfer (or a two-leg journey)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferInput {
    pub purpose: Option<TransferPurpose>,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
    /// Overrides the purpose-based routing decision
    pub via_transit: Option<bool>,
    #[validate]
    pub lines: Vec<CreateTransferLineInput>,
}

/// Quantity received for one product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLineInput {
    pub product_id: Uuid,
    pub qty: Decimal,
}

/// Input for recording a receipt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveTransferInput {
    #[serde(default)]
    pub lines: Vec<ReceiveLineInput>,
    /// Accept the transfer as complete even when short-received
    #[serde(default)]
    pub close: bool,
}

/// Input for flagging a receipt discrepancy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisputeTransferInput {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// Which side of a warehouse a transfer list is filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferScope {
    #[default]
    All,
    Incoming,
    Outgoing,
}

impl TransferScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferScope::All => "all",
            TransferScope::Incoming => "incoming",
            TransferScope::Outgoing => "outgoing",
        }
    }
}
