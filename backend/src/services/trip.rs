//! Delivery trips

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{clamp_limit, CreateTripInput, CreatedId, Trip, TripStatus};
use shared::validate_create_trip;

/// Delivery trip service
#[derive(Clone)]
pub struct TripService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TripListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct TripRow {
    id: Uuid,
    status: String,
    from_warehouse_id: Uuid,
    from_warehouse_name: String,
    driver_id: Uuid,
    driver_name: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = AppError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let status = TripStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown trip status {}", row.status)))?;

        Ok(Trip {
            id: row.id,
            status,
            from_warehouse_id: row.from_warehouse_id,
            from_warehouse_name: row.from_warehouse_name,
            driver_id: row.driver_id,
            driver_name: row.driver_name,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

impl TripService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List trips, newest first
    pub async fn list(&self, query: TripListQuery) -> AppResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT t.id, t.status, t.from_warehouse_id, w.name AS from_warehouse_name,
                   t.driver_id, d.name AS driver_name, t.note, t.created_at
            FROM delivery_trips t
            JOIN warehouses w ON w.id = t.from_warehouse_id
            JOIN drivers d ON d.id = t.driver_id
            ORDER BY t.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Trip::try_from).collect()
    }

    /// Plan a trip leaving a warehouse with a driver
    pub async fn create(&self, input: CreateTripInput) -> AppResult<CreatedId> {
        validate_create_trip(&input)?;

        let warehouse_ok = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND is_active AND NOT is_system)",
        )
        .bind(input.from_warehouse_id)
        .fetch_one(&self.db)
        .await?;
        if !warehouse_ok {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        let driver_ok = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE id = $1 AND is_active)",
        )
        .bind(input.driver_id)
        .fetch_one(&self.db)
        .await?;
        if !driver_ok {
            return Err(AppError::NotFound("Driver".to_string()));
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO delivery_trips (from_warehouse_id, driver_id, note)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(input.from_warehouse_id)
        .bind(input.driver_id)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(trip_id = %id, "Delivery trip planned");
        Ok(CreatedId { id })
    }
}
