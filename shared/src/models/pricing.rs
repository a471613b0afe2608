//! Price grid models and seeding plans

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WarehouseKind;

/// A named set of per-product unit prices for one sales channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceList {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Price list row for selectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListOption {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

/// Unit price of one product in one grid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListItem {
    pub price_list_id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Decimal,
}

/// The two canonical grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceGrid {
    Depot,
    Store,
}

impl PriceGrid {
    pub const ALL: [PriceGrid; 2] = [PriceGrid::Depot, PriceGrid::Store];

    pub fn code(&self) -> &'static str {
        match self {
            PriceGrid::Depot => "TARIF_DEPOT",
            PriceGrid::Store => "TARIF_MAGASIN",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PriceGrid::Depot => "Tarif dépôt",
            PriceGrid::Store => "Tarif magasin",
        }
    }

    /// Grid a location of the given kind sells from
    pub fn for_kind(kind: WarehouseKind) -> Self {
        match kind {
            WarehouseKind::Depot => PriceGrid::Depot,
            WarehouseKind::Store => PriceGrid::Store,
        }
    }
}

/// Product fields the price fill needs
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub id: Uuid,
    pub base_price: Decimal,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PricedProduct {
    pub fn is_sellable(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// First requested product that is unknown, inactive or deleted
pub fn first_unavailable_product(requested: &[Uuid], products: &[PricedProduct]) -> Option<Uuid> {
    requested
        .iter()
        .copied()
        .find(|id| !products.iter().any(|p| p.id == *id && p.is_sellable()))
}

/// Negative base prices are stored as zero
pub fn clamp_unit_price(price: Decimal) -> Decimal {
    price.max(Decimal::ZERO)
}

/// Items to create so every sellable product has a price in the grid.
///
/// Products already priced in the grid are skipped; existing prices are never
/// overwritten.
pub fn plan_price_fill(
    price_list_id: Uuid,
    products: &[PricedProduct],
    already_priced: &HashSet<Uuid>,
) -> Vec<PriceListItem> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter(|p| p.is_sellable())
        .filter(|p| !already_priced.contains(&p.id))
        .filter(|p| seen.insert(p.id))
        .map(|p| PriceListItem {
            price_list_id,
            product_id: p.id,
            unit_price: clamp_unit_price(p.base_price),
        })
        .collect()
}

/// Counters reported by one seed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub depot_price_list_id: Option<Uuid>,
    pub store_price_list_id: Option<Uuid>,
    pub warehouses_backfilled: u64,
    pub stores_backfilled: u64,
    pub fill_prices: bool,
    pub depot_items_created: u64,
    pub store_items_created: u64,
}
