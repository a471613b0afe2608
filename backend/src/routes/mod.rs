//! Route definitions for the Retail Ops Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/pricelists", get(handlers::list_price_lists))
        .route("/warehouses", get(handlers::list_warehouses))
        .nest("/stores", store_routes())
        .route("/sales", get(handlers::list_sales))
        .nest("/pos", pos_routes())
        .nest("/delivery-trips", trip_routes())
        .nest("/stock-transfers", transfer_routes())
}

fn store_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_stores).post(handlers::create_store))
}

fn pos_routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", get(handlers::list_receipts))
        .route("/receipts/:id", get(handlers::get_receipt))
}

fn trip_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_trips).post(handlers::create_trip))
}

/// Stock transfer routes
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/grouped", get(handlers::list_grouped_transfers))
        .route("/journeys/:journey_id", get(handlers::get_journey))
        .route("/:id", get(handlers::get_transfer))
        .route("/:id/ship", post(handlers::ship_transfer))
        .route("/:id/receive", post(handlers::receive_transfer))
        .route("/:id/cancel", post(handlers::cancel_transfer))
        .route("/:id/dispute", post(handlers::dispute_transfer))
}
