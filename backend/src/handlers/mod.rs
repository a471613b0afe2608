//! HTTP handlers for the Retail Ops Platform API

pub mod directory;
pub mod health;
pub mod sales;
pub mod transfer;
pub mod trip;

pub use directory::*;
pub use health::*;
pub use sales::*;
pub use transfer::*;
pub use trip::*;
