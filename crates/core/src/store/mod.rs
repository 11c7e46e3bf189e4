//! Tiered read orchestration
//!
//! The [`TieredStore`] decides per request which tiers participate and in
//! what order, then walks them cheapest first until one reports a hit.

pub mod plan;
pub mod service;

pub use plan::TierPlan;
pub use service::{ReadOutcome, ReadRequest, TieredStore, TieredStoreBuilder};
