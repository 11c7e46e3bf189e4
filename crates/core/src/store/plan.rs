//! Per-request tier participation

use crate::ports::Tier;

/// Which tiers a single read consults
///
/// Tiers are always queried in [`Tier::ALL`] order; the plan only switches
/// them on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPlan {
    pub local_cache: bool,
    pub distributed_cache: bool,
    pub durable_storage: bool,
    /// Set when the distributed-cache degrade override fired
    pub degraded: bool,
}

impl TierPlan {
    /// Local cache is opt-in; distributed cache and storage are on
    pub const BASELINE: Self =
        Self { local_cache: false, distributed_cache: true, durable_storage: true, degraded: false };

    /// Bypass every cache
    pub const DURABLE_ONLY: Self =
        Self { local_cache: false, distributed_cache: false, durable_storage: true, degraded: false };

    pub fn includes(&self, tier: Tier) -> bool {
        match tier {
            Tier::LocalCache => self.local_cache,
            Tier::DistributedCache => self.distributed_cache,
            Tier::DurableStorage => self.durable_storage,
        }
    }

    /// Enabled tiers in query order
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        Tier::ALL.into_iter().filter(move |tier| self.includes(*tier))
    }
}
