//! HTTP handlers for delivery trips

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::{CreateTripInput, CreatedId, ItemResponse, ItemsResponse, Trip};
use crate::services::trip::{TripListQuery, TripService};
use crate::AppState;

pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> AppResult<Json<ItemsResponse<Trip>>> {
    let service = TripService::new(state.db);
    let trips = service.list(query).await?;
    Ok(Json(ItemsResponse::new(trips)))
}

/// Plan a trip
pub async fn create_trip(
    State(state): State<AppState>,
    Json(input): Json<CreateTripInput>,
) -> AppResult<(StatusCode, Json<ItemResponse<CreatedId>>)> {
    let service = TripService::new(state.db);
    let created = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::new(created))))
}
