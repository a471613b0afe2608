//! Domain models for the Retail Ops Platform

mod pricing;
mod sales;
mod transfer;
mod trip;
mod warehouse;

pub use pricing::*;
pub use sales::*;
pub use transfer::*;
pub use trip::*;
pub use warehouse::*;
