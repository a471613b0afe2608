//! HTTP handlers for sales and POS receipts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ItemResponse, ItemsResponse, ReceiptItem, ReceiptRow, SaleListRow};
use crate::services::sales::{ReceiptListQuery, SaleListQuery, SalesService};
use crate::AppState;

pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<ItemsResponse<SaleListRow>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_sales(query).await?;
    Ok(Json(ItemsResponse::new(sales)))
}

pub async fn list_receipts(
    State(state): State<AppState>,
    Query(query): Query<ReceiptListQuery>,
) -> AppResult<Json<ItemsResponse<ReceiptRow>>> {
    let service = SalesService::new(state.db);
    let receipts = service.list_receipts(query).await?;
    Ok(Json(ItemsResponse::new(receipts)))
}

/// Receipt detail with lines
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemResponse<ReceiptItem>>> {
    let service = SalesService::new(state.db);
    let receipt = service.get_receipt(id).await?;
    Ok(Json(ItemResponse::new(receipt)))
}
