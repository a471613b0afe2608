//! Sales and point-of-sale receipt view models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Draft,
    Confirmed,
    Paid,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "DRAFT",
            SaleStatus::Confirmed => "CONFIRMED",
            SaleStatus::Paid => "PAID",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(SaleStatus::Draft),
            "CONFIRMED" => Some(SaleStatus::Confirmed),
            "PAID" => Some(SaleStatus::Paid),
            "CANCELLED" => Some(SaleStatus::Cancelled),
            _ => None,
        }
    }
}

/// Row of the sales list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListRow {
    pub id: Uuid,
    pub number: String,
    pub status: SaleStatus,
    pub store_id: Option<Uuid>,
    pub store_name: Option<String>,
    pub client_name: Option<String>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Row of the receipt list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRow {
    pub id: Uuid,
    pub number: String,
    pub store_id: Uuid,
    pub store_name: String,
    pub sale_id: Uuid,
    pub total: Decimal,
    pub payment_method: String,
    pub issued_at: DateTime<Utc>,
}

/// Receipt detail with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    #[serde(flatten)]
    pub receipt: ReceiptRow,
    pub sale_number: String,
    pub lines: Vec<ReceiptLine>,
}

/// A product line printed on a receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Sum of receipt line totals
pub fn receipt_total(lines: &[ReceiptLine]) -> Decimal {
    lines.iter().map(|l| l.line_total).sum()
}
