//! Tier-side resilience wiring
//!
//! A [`CoalescingTierReader`] wraps one tier client with request coalescing
//! and a rolling window of its outcomes; an [`ErrorRateProbe`] turns that
//! window into the fail-over signal the orchestrator consumes.

pub mod probe;
pub mod reader;

pub use probe::ErrorRateProbe;
pub use reader::CoalescingTierReader;
