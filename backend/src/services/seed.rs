//! Price grid seeding
//!
//! Makes sure the depot and store grids exist, points every unassigned
//! location at the grid of its channel, and optionally prices every sellable
//! product that has no price yet. Each step only fills gaps, so the seed can
//! be re-run at any time.

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{plan_price_fill, PriceGrid, PriceListItem, PricedProduct, SeedSummary, WarehouseKind};

/// Persistence needed by the seed
#[allow(async_fn_in_trait)]
pub trait PriceListStore {
    /// Insert the grid or rename the existing row with that code; returns its id
    async fn upsert_price_list(&self, code: &str, name: &str) -> AppResult<Uuid>;

    /// Assign the grid to non-system warehouses of `kind` that have none
    async fn backfill_warehouses(&self, kind: WarehouseKind, price_list_id: Uuid) -> AppResult<u64>;

    /// Assign the grid to stores that have none
    async fn backfill_stores(&self, price_list_id: Uuid) -> AppResult<u64>;

    async fn products(&self) -> AppResult<Vec<PricedProduct>>;

    /// Products that already have an item in the grid
    async fn priced_product_ids(&self, price_list_id: Uuid) -> AppResult<HashSet<Uuid>>;

    /// Insert items, skipping any that exist by then; returns rows written
    async fn insert_items(&self, items: &[PriceListItem]) -> AppResult<u64>;
}

/// Seed switches
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedOptions {
    pub fill_prices: bool,
}

impl SeedOptions {
    /// Read `SEED_FILL_PRICES` (`1` or `true` turns the fill on)
    pub fn from_env() -> Self {
        let fill_prices = std::env::var("SEED_FILL_PRICES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { fill_prices }
    }
}

/// Run the whole seed against a store
pub async fn run_seed<S: PriceListStore>(repo: &S, options: SeedOptions) -> AppResult<SeedSummary> {
    let depot_list = repo
        .upsert_price_list(PriceGrid::Depot.code(), PriceGrid::Depot.name())
        .await?;
    let store_list = repo
        .upsert_price_list(PriceGrid::Store.code(), PriceGrid::Store.name())
        .await?;

    let warehouses_backfilled = repo.backfill_warehouses(WarehouseKind::Depot, depot_list).await?
        + repo.backfill_warehouses(WarehouseKind::Store, store_list).await?;
    let stores_backfilled = repo.backfill_stores(store_list).await?;

    let mut summary = SeedSummary {
        depot_price_list_id: Some(depot_list),
        store_price_list_id: Some(store_list),
        warehouses_backfilled,
        stores_backfilled,
        fill_prices: options.fill_prices,
        ..SeedSummary::default()
    };

    if options.fill_prices {
        let products = repo.products().await?;
        for grid in PriceGrid::ALL {
            let list_id = match grid {
                PriceGrid::Depot => depot_list,
                PriceGrid::Store => store_list,
            };
            let existing = repo.priced_product_ids(list_id).await?;
            let plan = plan_price_fill(list_id, &products, &existing);
            let created = repo.insert_items(&plan).await?;
            tracing::debug!(grid = grid.code(), planned = plan.len(), created, "Price grid filled");

            match grid {
                PriceGrid::Depot => summary.depot_items_created = created,
                PriceGrid::Store => summary.store_items_created = created,
            }
        }
    }

    Ok(summary)
}

/// PostgreSQL implementation
#[derive(Clone)]
pub struct PgPriceListStore {
    db: PgPool,
}

impl PgPriceListStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: Uuid,
    base_price: Decimal,
    is_active: bool,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<ProductRow> for PricedProduct {
    fn from(r: ProductRow) -> Self {
        PricedProduct {
            id: r.id,
            base_price: r.base_price,
            is_active: r.is_active,
            deleted_at: r.deleted_at,
        }
    }
}

impl PriceListStore for PgPriceListStore {
    async fn upsert_price_list(&self, code: &str, name: &str) -> AppResult<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO price_lists (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn backfill_warehouses(&self, kind: WarehouseKind, price_list_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE warehouses
            SET price_list_id = $1
            WHERE price_list_id IS NULL AND kind = $2 AND NOT is_system
            "#,
        )
        .bind(price_list_id)
        .bind(kind.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn backfill_stores(&self, price_list_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("UPDATE stores SET price_list_id = $1 WHERE price_list_id IS NULL")
            .bind(price_list_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn products(&self) -> AppResult<Vec<PricedProduct>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, base_price, is_active, deleted_at FROM products WHERE is_active AND deleted_at IS NULL",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PricedProduct::from).collect())
    }

    async fn priced_product_ids(&self, price_list_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM price_list_items WHERE price_list_id = $1",
        )
        .bind(price_list_id)
        .fetch_all(&self.db)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_items(&self, items: &[PriceListItem]) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let mut written = 0;
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO price_list_items (price_list_id, product_id, unit_price)
                VALUES ($1, $2, $3)
                ON CONFLICT (price_list_id, product_id) DO NOTHING
                "#,
            )
            .bind(item.price_list_id)
            .bind(item.product_id)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_prices_flag() {
        std::env::set_var("SEED_FILL_PRICES", "1");
        assert!(SeedOptions::from_env().fill_prices);
        std::env::set_var("SEED_FILL_PRICES", "0");
        assert!(!SeedOptions::from_env().fill_prices);
        std::env::remove_var("SEED_FILL_PRICES");
        assert!(!SeedOptions::from_env().fill_prices);
    }
}
