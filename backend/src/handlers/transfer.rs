//! HTTP handlers for stock transfer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    CreateTransferInput, DisputeTransferInput, ItemResponse, ItemsResponse, ReceiveTransferInput,
    StockTransfer,
};
use crate::services::transfer::{TransferListQuery, TransferService};
use crate::AppState;
use shared::{JourneyView, TransferGroup};

fn service(state: AppState) -> TransferService {
    TransferService::new(state.db, &state.config.transfers)
}

/// List transfers
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<TransferListQuery>,
) -> AppResult<Json<ItemsResponse<StockTransfer>>> {
    let transfers = service(state).list(&query).await?;
    Ok(Json(ItemsResponse::new(transfers)))
}

/// List transfers grouped by journey
pub async fn list_grouped_transfers(
    State(state): State<AppState>,
    Query(query): Query<TransferListQuery>,
) -> AppResult<Json<ItemsResponse<TransferGroup>>> {
    let groups = service(state).list_grouped(&query).await?;
    Ok(Json(ItemsResponse::new(groups)))
}

/// Create a transfer (two legs when routed through TRANSIT)
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<ItemsResponse<StockTransfer>>> {
    let created = service(state).create(input).await?;
    Ok(Json(ItemsResponse::new(created)))
}

/// Get a transfer by ID
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemResponse<StockTransfer>>> {
    let transfer = service(state).get(id).await?;
    Ok(Json(ItemResponse::new(transfer)))
}

/// Get both legs of a journey
pub async fn get_journey(
    State(state): State<AppState>,
    Path(journey_id): Path<Uuid>,
) -> AppResult<Json<ItemResponse<JourneyView>>> {
    let journey = service(state).get_journey(journey_id).await?;
    Ok(Json(ItemResponse::new(journey)))
}

pub async fn ship_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemResponse<StockTransfer>>> {
    let transfer = service(state).ship(id).await?;
    Ok(Json(ItemResponse::new(transfer)))
}

pub async fn receive_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReceiveTransferInput>,
) -> AppResult<Json<ItemResponse<StockTransfer>>> {
    let transfer = service(state).receive(id, input).await?;
    Ok(Json(ItemResponse::new(transfer)))
}

pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemResponse<StockTransfer>>> {
    let transfer = service(state).cancel(id).await?;
    Ok(Json(ItemResponse::new(transfer)))
}

pub async fn dispute_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DisputeTransferInput>,
) -> AppResult<Json<ItemResponse<StockTransfer>>> {
    let transfer = service(state).dispute(id, input).await?;
    Ok(Json(ItemResponse::new(transfer)))
}
