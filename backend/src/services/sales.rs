//! Sales list and point-of-sale receipt views

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::pricing::search_pattern;
use crate::error::{AppError, AppResult};
use crate::models::{clamp_limit, ReceiptItem, ReceiptLine, ReceiptRow, SaleListRow, SaleStatus};

/// Read-only service over sales and issued receipts
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    /// Substring of the sale number or client name
    pub q: Option<String>,
    pub status: Option<SaleStatus>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptListQuery {
    pub store_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    number: String,
    status: String,
    store_id: Option<Uuid>,
    store_name: Option<String>,
    client_name: Option<String>,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for SaleListRow {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let status = SaleStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown sale status {}", row.status)))?;

        Ok(SaleListRow {
            id: row.id,
            number: row.number,
            status,
            store_id: row.store_id,
            store_name: row.store_name,
            client_name: row.client_name,
            total: row.total,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReceiptDbRow {
    id: Uuid,
    number: String,
    store_id: Uuid,
    store_name: String,
    sale_id: Uuid,
    sale_number: String,
    total: Decimal,
    payment_method: String,
    issued_at: DateTime<Utc>,
}

impl ReceiptDbRow {
    fn into_row(self) -> (ReceiptRow, String) {
        (
            ReceiptRow {
                id: self.id,
                number: self.number,
                store_id: self.store_id,
                store_name: self.store_name,
                sale_id: self.sale_id,
                total: self.total,
                payment_method: self.payment_method,
                issued_at: self.issued_at,
            },
            self.sale_number,
        )
    }
}

#[derive(Debug, FromRow)]
struct ReceiptLineRow {
    product_id: Uuid,
    product_name: String,
    qty: Decimal,
    unit_price: Decimal,
    line_total: Decimal,
}

impl SalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List sales, newest first
    pub async fn list_sales(&self, query: SaleListQuery) -> AppResult<Vec<SaleListRow>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT s.id, s.number, s.status, s.store_id, st.name AS store_name,
                   s.client_name, s.total, s.created_at
            FROM sales s
            LEFT JOIN stores st ON st.id = s.store_id
            WHERE ($1::text IS NULL OR s.number ILIKE $1 OR s.client_name ILIKE $1)
              AND ($2::text IS NULL OR s.status = $2)
            ORDER BY s.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(search_pattern(query.q.as_deref()))
        .bind(query.status.map(|s| s.as_str()))
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SaleListRow::try_from).collect()
    }

    /// List issued receipts, newest first
    pub async fn list_receipts(&self, query: ReceiptListQuery) -> AppResult<Vec<ReceiptRow>> {
        let rows = sqlx::query_as::<_, ReceiptDbRow>(
            r#"
            SELECT r.id, r.number, r.store_id, st.name AS store_name, r.sale_id,
                   s.number AS sale_number, r.total, r.payment_method, r.issued_at
            FROM pos_receipts r
            JOIN stores st ON st.id = r.store_id
            JOIN sales s ON s.id = r.sale_id
            WHERE ($1::uuid IS NULL OR r.store_id = $1)
            ORDER BY r.issued_at DESC
            LIMIT $2
            "#,
        )
        .bind(query.store_id)
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_row().0).collect())
    }

    /// Receipt detail with the lines of its sale
    pub async fn get_receipt(&self, id: Uuid) -> AppResult<ReceiptItem> {
        let row = sqlx::query_as::<_, ReceiptDbRow>(
            r#"
            SELECT r.id, r.number, r.store_id, st.name AS store_name, r.sale_id,
                   s.number AS sale_number, r.total, r.payment_method, r.issued_at
            FROM pos_receipts r
            JOIN stores st ON st.id = r.store_id
            JOIN sales s ON s.id = r.sale_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Receipt".to_string()))?;

        let (receipt, sale_number) = row.into_row();

        let lines = sqlx::query_as::<_, ReceiptLineRow>(
            r#"
            SELECT sl.product_id, p.name AS product_name, sl.qty, sl.unit_price, sl.line_total
            FROM sale_lines sl
            JOIN products p ON p.id = sl.product_id
            WHERE sl.sale_id = $1
            ORDER BY sl.position
            "#,
        )
        .bind(receipt.sale_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|l| ReceiptLine {
            product_id: l.product_id,
            product_name: l.product_name,
            qty: l.qty,
            unit_price: l.unit_price,
            line_total: l.line_total,
        })
        .collect();

        Ok(ReceiptItem {
            receipt,
            sale_number,
            lines,
        })
    }
}
