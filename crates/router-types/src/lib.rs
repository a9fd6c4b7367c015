//! Value types shared across the liquidity router.
//!
//! This crate defines the asset and order model consumed by the graph,
//! planner and ingestion crates. Types here carry no behavior beyond
//! construction, comparison and hashing.

pub mod asset;
pub mod events;
pub mod order;

pub use asset::*;
pub use events::*;
pub use order::*;
