//! Business logic services for the Retail Ops Platform

pub mod pricing;
pub mod sales;
pub mod seed;
pub mod store;
pub mod transfer;
pub mod trip;
pub mod warehouse;

pub use pricing::PriceListService;
pub use sales::SalesService;
pub use seed::{run_seed, PgPriceListStore, PriceListStore, SeedOptions};
pub use store::StoreService;
pub use transfer::TransferService;
pub use trip::TripService;
pub use warehouse::WarehouseService;
