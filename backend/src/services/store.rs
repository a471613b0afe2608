//! Store directory

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{clamp_limit, CreateStoreInput, Store, StoreMini};
use shared::validate_create_store;

/// Store service
#[derive(Clone)]
pub struct StoreService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct StoreRow {
    id: Uuid,
    code: String,
    name: String,
    address: Option<String>,
    is_active: bool,
    price_list_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            code: row.code,
            name: row.name,
            address: row.address,
            is_active: row.is_active,
            price_list_id: row.price_list_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StoreMiniRow {
    id: Uuid,
    code: String,
    name: String,
    is_active: bool,
}

impl StoreService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List stores ordered by code
    pub async fn list(&self, query: StoreListQuery) -> AppResult<Vec<StoreMini>> {
        let rows = sqlx::query_as::<_, StoreMiniRow>(
            r#"
            SELECT id, code, name, is_active
            FROM stores
            ORDER BY code
            LIMIT $1
            "#,
        )
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StoreMini {
                id: r.id,
                code: r.code,
                name: r.name,
                is_active: r.is_active,
            })
            .collect())
    }

    /// Create a store; the code is normalized to upper case
    pub async fn create(&self, mut input: CreateStoreInput) -> AppResult<Store> {
        input.code = input.code.trim().to_uppercase();
        input.name = input.name.trim().to_string();
        validate_create_store(&input)?;

        let result = sqlx::query_as::<_, StoreRow>(
            r#"
            INSERT INTO stores (code, name, address, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, name, address, is_active, price_list_id, created_at
            "#,
        )
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.address)
        .bind(input.is_active)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(row) => {
                tracing::info!(store_id = %row.id, code = %row.code, "Store created");
                Ok(row.into())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("Store code {} already exists", input.code)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
