//! Shared types and domain logic for the Retail Ops Platform
//!
//! This crate contains the models, the stock-transfer workflow and the
//! validation rules shared between the backend, the API client and the
//! frontend (via WASM).

pub mod journey;
pub mod models;
pub mod types;
pub mod validation;
pub mod workflow;

pub use journey::*;
pub use models::*;
pub use types::*;
pub use validation::*;
pub use workflow::*;
