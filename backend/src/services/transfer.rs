//! Stock transfer service
//!
//! Every mutation runs in a single transaction that first locks the transfer
//! row, applies the pure workflow from the shared crate to the loaded
//! transfer, then writes back the header, the touched lines and the stock
//! level movements.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::seed::ProductRow;
use super::warehouse::WarehouseService;
use crate::config::TransferConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    clamp_limit, first_unavailable_product, CreateTransferInput, DisputeTransferInput,
    PricedProduct, ReceiveTransferInput, StockTransfer, StockTransferLine, TransferPurpose,
    TransferScope, TransferStatus, Warehouse, WarehouseKind, WarehouseRef,
};
use shared::{
    build_journey, ensure_leg_can_ship, group_by_journey, needs_transit, plan_route,
    validate_create_transfer, validate_dispute, validate_receive, workflow, JourneyView, LegPlan,
    TransferGroup,
};

/// Stock transfer service
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    track_stock: bool,
}

/// Filters of the transfer list
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferListQuery {
    pub status: Option<TransferStatus>,
    #[serde(default)]
    pub scope: TransferScope,
    /// Warehouse the scope is relative to
    pub warehouse_id: Option<Uuid>,
    /// Substring of the note, a location code or name, or the id
    pub q: Option<String>,
    pub limit: Option<i64>,
}

const TRANSFER_SELECT: &str = r#"
    SELECT t.id, t.status, t.purpose, t.journey_id, t.note, t.dispute_reason,
           t.shipped_at, t.received_at, t.created_at, t.updated_at,
           fw.id AS from_id, fw.code AS from_code, fw.name AS from_name,
           fw.kind AS from_kind, fw.is_system AS from_is_system,
           tw.id AS to_id, tw.code AS to_code, tw.name AS to_name,
           tw.kind AS to_kind, tw.is_system AS to_is_system
    FROM stock_transfers t
    JOIN warehouses fw ON fw.id = t.from_warehouse_id
    JOIN warehouses tw ON tw.id = t.to_warehouse_id
"#;

#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    status: String,
    purpose: Option<String>,
    journey_id: Option<Uuid>,
    note: Option<String>,
    dispute_reason: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    received_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    from_id: Uuid,
    from_code: String,
    from_name: String,
    from_kind: String,
    from_is_system: bool,
    to_id: Uuid,
    to_code: String,
    to_name: String,
    to_kind: String,
    to_is_system: bool,
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    transfer_id: Uuid,
    product_id: Uuid,
    qty: Decimal,
    qty_received: Decimal,
    note: Option<String>,
}

fn warehouse_ref(
    id: Uuid,
    code: String,
    name: String,
    kind: &str,
    is_system: bool,
) -> AppResult<WarehouseRef> {
    let kind = WarehouseKind::from_str(kind)
        .ok_or_else(|| AppError::Internal(format!("Unknown warehouse kind {}", kind)))?;
    Ok(WarehouseRef {
        id,
        code,
        name,
        kind,
        is_system,
    })
}

impl TransferRow {
    fn into_transfer(self, lines: Vec<StockTransferLine>) -> AppResult<StockTransfer> {
        let status = TransferStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown transfer status {}", self.status)))?;
        let purpose = match self.purpose.as_deref() {
            Some(p) => Some(
                TransferPurpose::from_str(p)
                    .ok_or_else(|| AppError::Internal(format!("Unknown transfer purpose {}", p)))?,
            ),
            None => None,
        };

        Ok(StockTransfer {
            id: self.id,
            status,
            purpose,
            from_warehouse: warehouse_ref(
                self.from_id,
                self.from_code,
                self.from_name,
                &self.from_kind,
                self.from_is_system,
            )?,
            to_warehouse: warehouse_ref(
                self.to_id,
                self.to_code,
                self.to_name,
                &self.to_kind,
                self.to_is_system,
            )?,
            journey_id: self.journey_id,
            note: self.note,
            dispute_reason: self.dispute_reason,
            shipped_at: self.shipped_at,
            received_at: self.received_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lines,
        })
    }
}

/// Load the lines of the given rows and assemble full transfers, keeping row order
async fn attach_lines(
    conn: &mut PgConnection,
    rows: Vec<TransferRow>,
) -> AppResult<Vec<StockTransfer>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let line_rows = sqlx::query_as::<_, LineRow>(
        r#"
        SELECT id, transfer_id, product_id, qty, qty_received, note
        FROM stock_transfer_lines
        WHERE transfer_id = ANY($1)
        ORDER BY transfer_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_transfer: HashMap<Uuid, Vec<StockTransferLine>> = HashMap::new();
    for l in line_rows {
        by_transfer
            .entry(l.transfer_id)
            .or_default()
            .push(StockTransferLine {
                id: l.id,
                product_id: l.product_id,
                qty: l.qty,
                qty_received: l.qty_received,
                note: l.note,
            });
    }

    rows.into_iter()
        .map(|row| {
            let lines = by_transfer.remove(&row.id).unwrap_or_default();
            row.into_transfer(lines)
        })
        .collect()
}

async fn fetch_transfer(conn: &mut PgConnection, id: Uuid, lock: bool) -> AppResult<StockTransfer> {
    let sql = if lock {
        format!("{} WHERE t.id = $1 FOR UPDATE OF t", TRANSFER_SELECT)
    } else {
        format!("{} WHERE t.id = $1", TRANSFER_SELECT)
    };

    let row = sqlx::query_as::<_, TransferRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock transfer".to_string()))?;

    attach_lines(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Stock transfer".to_string()))
}

async fn fetch_journey_legs(
    conn: &mut PgConnection,
    journey_ids: &[Uuid],
) -> AppResult<Vec<StockTransfer>> {
    let sql = format!(
        "{} WHERE t.journey_id = ANY($1) ORDER BY t.created_at",
        TRANSFER_SELECT
    );
    let rows = sqlx::query_as::<_, TransferRow>(&sql)
        .bind(journey_ids)
        .fetch_all(&mut *conn)
        .await?;

    attach_lines(conn, rows).await
}

/// Move `qty` out of a location. The update only matches when enough is on
/// hand, so two concurrent shipments can never both take the last units.
async fn take_stock(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    product_id: Uuid,
    qty: Decimal,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_levels
        SET qty = qty - $3, updated_at = NOW()
        WHERE warehouse_id = $1 AND product_id = $2 AND qty >= $3
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = sqlx::query_scalar::<_, Decimal>(
            "SELECT qty FROM stock_levels WHERE warehouse_id = $1 AND product_id = $2",
        )
        .bind(warehouse_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(Decimal::ZERO);

        return Err(AppError::InsufficientStock {
            product_id,
            available,
            requested: qty,
        });
    }
    Ok(())
}

async fn put_stock(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    product_id: Uuid,
    qty: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_levels (warehouse_id, product_id, qty)
        VALUES ($1, $2, $3)
        ON CONFLICT (warehouse_id, product_id)
        DO UPDATE SET qty = stock_levels.qty + EXCLUDED.qty, updated_at = NOW()
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_header(conn: &mut PgConnection, transfer: &StockTransfer) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE stock_transfers
        SET status = $2, shipped_at = $3, received_at = $4,
            dispute_reason = $5, updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(transfer.id)
    .bind(transfer.status.as_str())
    .bind(transfer.shipped_at)
    .bind(transfer.received_at)
    .bind(&transfer.dispute_reason)
    .bind(transfer.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl TransferService {
    pub fn new(db: PgPool, config: &TransferConfig) -> Self {
        Self {
            db,
            track_stock: config.track_stock,
        }
    }

    /// Create a transfer, or the two legs of a journey through TRANSIT.
    ///
    /// Legs are written one transaction each. If the second leg fails the
    /// first one stays as a DRAFT with a journey id and no sibling.
    pub async fn create(&self, input: CreateTransferInput) -> AppResult<Vec<StockTransfer>> {
        validate_create_transfer(&input)?;

        let warehouses = WarehouseService::new(self.db.clone());
        let from = self.endpoint(&warehouses, input.from_warehouse_id, "fromWarehouseId").await?;
        let to = self.endpoint(&warehouses, input.to_warehouse_id, "toWarehouseId").await?;

        let transit = if needs_transit(input.purpose, input.via_transit) {
            warehouses.transit().await?.map(|w| w.to_ref())
        } else {
            None
        };

        let plan = plan_route(
            input.purpose,
            input.via_transit,
            from.to_ref(),
            to.to_ref(),
            transit,
            Uuid::new_v4(),
        )?;

        self.ensure_products_exist(&input).await?;

        let journey_id = plan.journey_id();
        let mut created: Vec<StockTransfer> = Vec::new();
        for leg in plan.legs() {
            match self.insert_leg(leg, journey_id, &input).await {
                Ok(transfer) => created.push(transfer),
                Err(e) => {
                    if let Some(first) = created.first() {
                        tracing::error!(
                            journey_id = ?journey_id,
                            first_leg_id = %first.id,
                            "Second journey leg could not be created: {}",
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(
            journey_id = ?journey_id,
            legs = created.len(),
            from = %from.code,
            to = %to.code,
            "Stock transfer created"
        );
        Ok(created)
    }

    async fn endpoint(
        &self,
        warehouses: &WarehouseService,
        id: Uuid,
        field: &str,
    ) -> AppResult<Warehouse> {
        let warehouse = warehouses.get(id).await?;
        if !warehouse.is_active {
            return Err(AppError::validation(
                field,
                format!("Warehouse {} is inactive", warehouse.code),
            ));
        }
        Ok(warehouse)
    }

    /// Every line must name an active, non-deleted product
    async fn ensure_products_exist(&self, input: &CreateTransferInput) -> AppResult<()> {
        let ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let products: Vec<PricedProduct> = sqlx::query_as::<_, ProductRow>(
            "SELECT id, base_price, is_active, deleted_at FROM products WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(PricedProduct::from)
        .collect();

        match first_unavailable_product(&ids, &products) {
            Some(missing) => Err(AppError::NotFound(format!("Product {}", missing))),
            None => Ok(()),
        }
    }

    async fn insert_leg(
        &self,
        leg: &LegPlan,
        journey_id: Option<Uuid>,
        input: &CreateTransferInput,
    ) -> AppResult<StockTransfer> {
        let mut tx = self.db.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_transfers (status, purpose, from_warehouse_id, to_warehouse_id, journey_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(TransferStatus::Draft.as_str())
        .bind(input.purpose.map(|p| p.as_str()))
        .bind(leg.from.id)
        .bind(leg.to.id)
        .bind(journey_id)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in input.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO stock_transfer_lines (transfer_id, position, product_id, qty, note)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(line.product_id)
            .bind(line.qty)
            .bind(&line.note)
            .execute(&mut *tx)
            .await?;
        }

        let transfer = fetch_transfer(&mut tx, id, false).await?;
        tx.commit().await?;
        Ok(transfer)
    }

    /// Get a transfer with its lines
    pub async fn get(&self, id: Uuid) -> AppResult<StockTransfer> {
        let mut conn = self.db.acquire().await?;
        fetch_transfer(&mut conn, id, false).await
    }

    /// List transfers, newest first
    pub async fn list(&self, query: &TransferListQuery) -> AppResult<Vec<StockTransfer>> {
        let pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let sql = format!(
            r#"{}
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::uuid IS NULL
                   OR ($3 = 'incoming' AND t.to_warehouse_id = $2)
                   OR ($3 = 'outgoing' AND t.from_warehouse_id = $2)
                   OR ($3 = 'all' AND (t.from_warehouse_id = $2 OR t.to_warehouse_id = $2)))
              AND ($4::text IS NULL
                   OR t.note ILIKE $4 OR t.id::text ILIKE $4
                   OR fw.code ILIKE $4 OR fw.name ILIKE $4
                   OR tw.code ILIKE $4 OR tw.name ILIKE $4)
            ORDER BY t.created_at DESC
            LIMIT $5
            "#,
            TRANSFER_SELECT
        );

        let mut conn = self.db.acquire().await?;
        let rows = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(query.status.map(|s| s.as_str()))
            .bind(query.warehouse_id)
            .bind(query.scope.as_str())
            .bind(pattern)
            .bind(clamp_limit(query.limit))
            .fetch_all(&mut *conn)
            .await?;

        attach_lines(&mut conn, rows).await
    }

    /// List transfers with journey legs folded into one row per journey.
    ///
    /// Legs cut off by the page limit are loaded so each journey row is whole.
    pub async fn list_grouped(&self, query: &TransferListQuery) -> AppResult<Vec<TransferGroup>> {
        let mut transfers = self.list(query).await?;

        let journey_ids: Vec<Uuid> = transfers
            .iter()
            .filter_map(|t| t.journey_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if !journey_ids.is_empty() {
            let mut conn = self.db.acquire().await?;
            let known: HashSet<Uuid> = transfers.iter().map(|t| t.id).collect();
            let missing = fetch_journey_legs(&mut conn, &journey_ids)
                .await?
                .into_iter()
                .filter(|t| !known.contains(&t.id));
            transfers.extend(missing);
        }

        Ok(group_by_journey(transfers))
    }

    /// All legs of one journey
    pub async fn get_journey(&self, journey_id: Uuid) -> AppResult<JourneyView> {
        let mut conn = self.db.acquire().await?;
        let legs = fetch_journey_legs(&mut conn, &[journey_id]).await?;
        if legs.is_empty() {
            return Err(AppError::NotFound("Journey".to_string()));
        }
        Ok(build_journey(journey_id, legs))
    }

    /// DRAFT -> SHIPPED, taking the quantities out of the origin
    pub async fn ship(&self, id: Uuid) -> AppResult<StockTransfer> {
        let mut tx = self.db.begin().await?;
        let mut transfer = fetch_transfer(&mut tx, id, true).await?;

        if let Some(journey_id) = transfer.journey_id.filter(|_| transfer.is_second_leg()) {
            let siblings = fetch_journey_legs(&mut tx, &[journey_id]).await?;
            ensure_leg_can_ship(&transfer, &siblings)?;
        }

        let previous = transfer.status;
        workflow::ship(&mut transfer, Utc::now())?;

        if self.track_stock {
            for line in &transfer.lines {
                take_stock(&mut tx, transfer.from_warehouse.id, line.product_id, line.qty).await?;
            }
        }

        save_header(&mut tx, &transfer).await?;
        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.id,
            from = %previous.as_str(),
            to = %transfer.status.as_str(),
            "Stock transfer shipped"
        );
        Ok(transfer)
    }

    /// Record received quantities, crediting the destination
    pub async fn receive(&self, id: Uuid, input: ReceiveTransferInput) -> AppResult<StockTransfer> {
        validate_receive(&input)?;

        let mut tx = self.db.begin().await?;
        let mut transfer = fetch_transfer(&mut tx, id, true).await?;
        let outcome = workflow::receive(&mut transfer, &input, Utc::now())?;

        for applied in &outcome.applied {
            sqlx::query("UPDATE stock_transfer_lines SET qty_received = $2 WHERE id = $1")
                .bind(applied.line_id)
                .bind(applied.qty_received)
                .execute(&mut *tx)
                .await?;

            if self.track_stock {
                put_stock(&mut tx, transfer.to_warehouse.id, applied.product_id, applied.qty)
                    .await?;
            }
        }

        save_header(&mut tx, &transfer).await?;
        tx.commit().await?;

        if !outcome.short_lines.is_empty() {
            tracing::warn!(
                transfer_id = %transfer.id,
                short_lines = outcome.short_lines.len(),
                "Stock transfer closed short"
            );
        }
        tracing::info!(
            transfer_id = %transfer.id,
            from = %outcome.previous_status.as_str(),
            to = %outcome.status.as_str(),
            lines = outcome.applied.len(),
            "Stock transfer received"
        );
        Ok(transfer)
    }

    /// Cancel a transfer; quantities still on the road go back to the origin
    pub async fn cancel(&self, id: Uuid) -> AppResult<StockTransfer> {
        let mut tx = self.db.begin().await?;
        let mut transfer = fetch_transfer(&mut tx, id, true).await?;
        let previous = transfer.status;
        let returned = workflow::cancel(&mut transfer, Utc::now())?;

        if self.track_stock {
            for r in &returned {
                put_stock(&mut tx, transfer.from_warehouse.id, r.product_id, r.qty).await?;
            }
        }

        save_header(&mut tx, &transfer).await?;
        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.id,
            from = %previous.as_str(),
            returned_lines = returned.len(),
            "Stock transfer cancelled"
        );
        Ok(transfer)
    }

    /// Flag a receipt discrepancy
    pub async fn dispute(&self, id: Uuid, input: DisputeTransferInput) -> AppResult<StockTransfer> {
        validate_dispute(&input)?;

        let mut tx = self.db.begin().await?;
        let mut transfer = fetch_transfer(&mut tx, id, true).await?;
        let previous = transfer.status;
        workflow::dispute(&mut transfer, &input.reason, Utc::now())?;

        save_header(&mut tx, &transfer).await?;
        tx.commit().await?;

        tracing::warn!(
            transfer_id = %transfer.id,
            from = %previous.as_str(),
            "Stock transfer disputed"
        );
        Ok(transfer)
    }
}
