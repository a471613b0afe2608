//! Models used by the backend
//!
//! Re-exports the domain models and wire types from the shared crate

pub use shared::models::*;
pub use shared::types::*;
