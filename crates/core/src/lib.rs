//! # TierGuard Core
//!
//! Pure read-path logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for tier clients, health probes and policy sources
//! - The tiered store orchestrator and its tier-selection policy
//! - Coalescing tier readers backed by rolling outcome windows
//!
//! ## Architecture Principles
//! - Only depends on `tierguard-common`
//! - No cache drivers, databases or remote config clients
//! - All external collaborators via traits
//! - Deterministic, testable decision logic

pub mod config;
pub mod errors;
pub mod ports;
pub mod store;
pub mod tier;

pub use config::{
    PolicySettings, ProbeSettings, ReaderSettings, ResilienceConfig, WindowSettings,
};
pub use errors::{StoreError, StoreResult, TierClientError};
pub use ports::{
    CapabilityProbe, FetchParams, PolicyConfig, Tier, TierClient, TierFetch, TierReader,
    TierValue,
};
pub use store::{ReadOutcome, ReadRequest, TierPlan, TieredStore, TieredStoreBuilder};
pub use tier::{CoalescingTierReader, ErrorRateProbe};
