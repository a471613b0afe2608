//! Warehouse lookups shared by the listing endpoints and the transfer workflow

use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{clamp_limit, StatusFilter, Warehouse, WarehouseKind, TRANSIT_CODE};

/// Warehouse service
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

/// Query parameters for the warehouse list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseListQuery {
    /// Include the reserved TRANSIT location
    #[serde(default)]
    pub include_system: bool,
    #[serde(default)]
    pub status: StatusFilter,
    pub kind: Option<WarehouseKind>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
pub(crate) struct WarehouseRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: String,
    pub is_active: bool,
    pub is_system: bool,
    pub price_list_id: Option<Uuid>,
}

impl TryFrom<WarehouseRow> for Warehouse {
    type Error = AppError;

    fn try_from(row: WarehouseRow) -> Result<Self, Self::Error> {
        let kind = WarehouseKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown warehouse kind {}", row.kind)))?;

        Ok(Warehouse {
            id: row.id,
            code: row.code,
            name: row.name,
            kind,
            is_active: row.is_active,
            is_system: row.is_system,
            price_list_id: row.price_list_id,
        })
    }
}

impl WarehouseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List warehouses ordered by code
    pub async fn list(&self, query: WarehouseListQuery) -> AppResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, code, name, kind, is_active, is_system, price_list_id
            FROM warehouses
            WHERE ($1 OR NOT is_system)
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::boolean IS NULL OR is_active = $3)
            ORDER BY code
            LIMIT $4
            "#,
        )
        .bind(query.include_system)
        .bind(query.kind.map(|k| k.as_str()))
        .bind(query.status.is_active())
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Warehouse::try_from).collect()
    }

    /// Fetch one warehouse, system locations included
    pub async fn get(&self, id: Uuid) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, code, name, kind, is_active, is_system, price_list_id
            FROM warehouses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        row.try_into()
    }

    /// The reserved TRANSIT location, if the installation has one
    pub async fn transit(&self) -> AppResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, code, name, kind, is_active, is_system, price_list_id
            FROM warehouses
            WHERE code = $1 AND is_system AND is_active
            "#,
        )
        .bind(TRANSIT_CODE)
        .fetch_optional(&self.db)
        .await?;

        row.map(Warehouse::try_from).transpose()
    }
}
