//! Price grid seeding tests
//!
//! Runs the seed against an in-memory store:
//! - Re-running keeps exactly two grids
//! - Backfill never touches a location that already has a grid
//! - Price fill never duplicates (grid, product) items

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use retail_ops_backend::services::{run_seed, PriceListStore, SeedOptions};
use retail_ops_backend::AppResult;
use shared::{PriceGrid, PriceListItem, PricedProduct, WarehouseKind};

#[derive(Debug, Clone)]
struct MemWarehouse {
    id: Uuid,
    kind: WarehouseKind,
    is_system: bool,
    price_list_id: Option<Uuid>,
}

#[derive(Default)]
struct MemState {
    /// code -> (id, name)
    price_lists: HashMap<String, (Uuid, String)>,
    warehouses: Vec<MemWarehouse>,
    stores: Vec<Option<Uuid>>,
    products: Vec<PricedProduct>,
    items: Vec<PriceListItem>,
}

#[derive(Default)]
struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    fn with_locations(warehouses: Vec<MemWarehouse>, stores: Vec<Option<Uuid>>) -> Self {
        let store = MemStore::default();
        {
            let mut state = store.state.lock().unwrap();
            state.warehouses = warehouses;
            state.stores = stores;
        }
        store
    }

    fn add_product(&self, base_price: Decimal, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().products.push(PricedProduct {
            id,
            base_price,
            is_active,
            deleted_at: None,
        });
        id
    }
}

impl PriceListStore for MemStore {
    async fn upsert_price_list(&self, code: &str, name: &str) -> AppResult<Uuid> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .price_lists
            .entry(code.to_string())
            .or_insert_with(|| (Uuid::new_v4(), name.to_string()));
        entry.1 = name.to_string();
        Ok(entry.0)
    }

    async fn backfill_warehouses(&self, kind: WarehouseKind, price_list_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut n = 0;
        for w in state.warehouses.iter_mut() {
            if w.price_list_id.is_none() && w.kind == kind && !w.is_system {
                w.price_list_id = Some(price_list_id);
                n += 1;
            }
        }
        Ok(n)
    }

    async fn backfill_stores(&self, price_list_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut n = 0;
        for s in state.stores.iter_mut().filter(|s| s.is_none()) {
            *s = Some(price_list_id);
            n += 1;
        }
        Ok(n)
    }

    async fn products(&self) -> AppResult<Vec<PricedProduct>> {
        Ok(self.state.lock().unwrap().products.clone())
    }

    async fn priced_product_ids(&self, price_list_id: Uuid) -> AppResult<HashSet<Uuid>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.price_list_id == price_list_id)
            .map(|i| i.product_id)
            .collect())
    }

    async fn insert_items(&self, items: &[PriceListItem]) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut n = 0;
        for item in items {
            let exists = state
                .items
                .iter()
                .any(|i| i.price_list_id == item.price_list_id && i.product_id == item.product_id);
            if !exists {
                state.items.push(item.clone());
                n += 1;
            }
        }
        Ok(n)
    }
}

fn wh(kind: WarehouseKind, price_list_id: Option<Uuid>) -> MemWarehouse {
    MemWarehouse {
        id: Uuid::new_v4(),
        kind,
        is_system: false,
        price_list_id,
    }
}

const FILL: SeedOptions = SeedOptions { fill_prices: true };

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_twice_keeps_two_grids() {
        let store = MemStore::default();

        let first = run_seed(&store, SeedOptions::default()).await.unwrap();
        let second = run_seed(&store, SeedOptions::default()).await.unwrap();

        let state = store.state.lock().unwrap();
        assert_eq!(state.price_lists.len(), 2);
        assert_eq!(first.depot_price_list_id, second.depot_price_list_id);
        assert_eq!(first.store_price_list_id, second.store_price_list_id);
        assert_eq!(state.price_lists[PriceGrid::Depot.code()].1, "Tarif dépôt");
        assert_eq!(state.price_lists[PriceGrid::Store.code()].1, "Tarif magasin");
    }

    #[tokio::test]
    async fn test_backfill_by_kind_and_skips_preset() {
        let preset = Uuid::new_v4();
        let mut transit = wh(WarehouseKind::Depot, None);
        transit.is_system = true;
        let store = MemStore::with_locations(
            vec![
                wh(WarehouseKind::Depot, None),
                wh(WarehouseKind::Store, None),
                wh(WarehouseKind::Store, Some(preset)),
                transit,
            ],
            vec![None, Some(preset)],
        );

        let summary = run_seed(&store, SeedOptions::default()).await.unwrap();
        assert_eq!(summary.warehouses_backfilled, 2);
        assert_eq!(summary.stores_backfilled, 1);
        assert!(!summary.fill_prices);

        let depot_list = summary.depot_price_list_id.unwrap();
        let store_list = summary.store_price_list_id.unwrap();
        let state = store.state.lock().unwrap();
        assert_eq!(state.warehouses[0].price_list_id, Some(depot_list));
        assert_eq!(state.warehouses[1].price_list_id, Some(store_list));
        assert_eq!(state.warehouses[2].price_list_id, Some(preset));
        assert_eq!(state.warehouses[3].price_list_id, None);
        assert_eq!(state.stores, vec![Some(store_list), Some(preset)]);
    }

    #[tokio::test]
    async fn test_fill_prices_once_per_grid() {
        let store = MemStore::default();
        let cheap = store.add_product(Decimal::new(1250, 2), true);
        let negative = store.add_product(Decimal::new(-300, 2), true);
        store.add_product(Decimal::new(999, 2), false);

        let summary = run_seed(&store, FILL).await.unwrap();
        assert!(summary.fill_prices);
        assert_eq!(summary.depot_items_created, 2);
        assert_eq!(summary.store_items_created, 2);

        let again = run_seed(&store, FILL).await.unwrap();
        assert_eq!(again.depot_items_created, 0);
        assert_eq!(again.store_items_created, 0);

        let state = store.state.lock().unwrap();
        assert_eq!(state.items.len(), 4);
        let negative_item = state.items.iter().find(|i| i.product_id == negative).unwrap();
        assert_eq!(negative_item.unit_price, Decimal::ZERO);
        let cheap_item = state.items.iter().find(|i| i.product_id == cheap).unwrap();
        assert_eq!(cheap_item.unit_price, Decimal::new(1250, 2));
    }

    #[tokio::test]
    async fn test_fill_keeps_existing_prices() {
        let store = MemStore::default();
        let product = store.add_product(Decimal::new(500, 2), true);
        let summary = run_seed(&store, SeedOptions::default()).await.unwrap();
        let depot_list = summary.depot_price_list_id.unwrap();

        store.state.lock().unwrap().items.push(PriceListItem {
            price_list_id: depot_list,
            product_id: product,
            unit_price: Decimal::new(777, 2),
        });

        let summary = run_seed(&store, FILL).await.unwrap();
        assert_eq!(summary.depot_items_created, 0);
        assert_eq!(summary.store_items_created, 1);

        let state = store.state.lock().unwrap();
        let depot_item = state
            .items
            .iter()
            .find(|i| i.price_list_id == depot_list)
            .unwrap();
        assert_eq!(depot_item.unit_price, Decimal::new(777, 2));
    }

    #[tokio::test]
    async fn test_deleted_products_are_not_priced() {
        let store = MemStore::default();
        store.add_product(Decimal::ONE, true);
        store.state.lock().unwrap().products[0].deleted_at = Some(Utc::now());

        let summary = run_seed(&store, FILL).await.unwrap();
        assert_eq!(summary.depot_items_created, 0);
        assert_eq!(summary.store_items_created, 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn kind_strategy() -> impl Strategy<Value = WarehouseKind> {
        prop_oneof![Just(WarehouseKind::Depot), Just(WarehouseKind::Store)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Pre-set warehouses keep their grid whatever their kind, and the
        /// seed can run any number of times without adding rows
        #[test]
        fn prop_seed_is_idempotent(
            locations in prop::collection::vec((kind_strategy(), any::<bool>()), 0..12),
            prices in prop::collection::vec(-1_000i64..10_000, 0..10),
            runs in 1usize..4,
        ) {
            let preset = Uuid::new_v4();
            let warehouses: Vec<MemWarehouse> = locations
                .iter()
                .map(|(kind, has_grid)| wh(*kind, has_grid.then_some(preset)))
                .collect();
            let store = MemStore::with_locations(warehouses.clone(), vec![]);
            for cents in &prices {
                store.add_product(Decimal::new(*cents, 2), true);
            }

            for _ in 0..runs {
                tokio_test::block_on(run_seed(&store, FILL)).unwrap();
            }

            let state = store.state.lock().unwrap();
            prop_assert_eq!(state.price_lists.len(), 2);
            prop_assert_eq!(state.items.len(), prices.len() * 2);

            let pairs: HashSet<(Uuid, Uuid)> = state
                .items
                .iter()
                .map(|i| (i.price_list_id, i.product_id))
                .collect();
            prop_assert_eq!(pairs.len(), state.items.len());

            for (before, after) in warehouses.iter().zip(state.warehouses.iter()) {
                prop_assert_eq!(before.id, after.id);
                if before.price_list_id.is_some() {
                    prop_assert_eq!(after.price_list_id, Some(preset));
                } else {
                    prop_assert!(after.price_list_id.is_some());
                }
            }
        }
    }
}
