//! HTTP handlers for price lists, warehouses and stores

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::{CreateStoreInput, ItemResponse, ItemsResponse, PriceListOption, Store, StoreMini, Warehouse};
use crate::services::pricing::{PriceListQuery, PriceListService};
use crate::services::store::{StoreListQuery, StoreService};
use crate::services::warehouse::{WarehouseListQuery, WarehouseService};
use crate::AppState;

/// List price lists for selectors
pub async fn list_price_lists(
    State(state): State<AppState>,
    Query(query): Query<PriceListQuery>,
) -> AppResult<Json<ItemsResponse<PriceListOption>>> {
    let service = PriceListService::new(state.db);
    let lists = service.list(query).await?;
    Ok(Json(ItemsResponse::new(lists)))
}

/// List warehouses; TRANSIT only with `includeSystem=true`
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseListQuery>,
) -> AppResult<Json<ItemsResponse<Warehouse>>> {
    let service = WarehouseService::new(state.db);
    let warehouses = service.list(query).await?;
    Ok(Json(ItemsResponse::new(warehouses)))
}

pub async fn list_stores(
    State(state): State<AppState>,
    Query(query): Query<StoreListQuery>,
) -> AppResult<Json<ItemsResponse<StoreMini>>> {
    let service = StoreService::new(state.db);
    let stores = service.list(query).await?;
    Ok(Json(ItemsResponse::new(stores)))
}

pub async fn create_store(
    State(state): State<AppState>,
    Json(input): Json<CreateStoreInput>,
) -> AppResult<(StatusCode, Json<ItemResponse<Store>>)> {
    let service = StoreService::new(state.db);
    let store = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::new(store))))
}
