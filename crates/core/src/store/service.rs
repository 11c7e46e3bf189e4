//! Tiered store service - read-path orchestration
//!
//! Decision policy, in precedence order:
//! 1. `force_durable` bypasses every cache and reads durable storage only
//! 2. Baseline: local cache off, distributed cache on, durable storage on
//! 3. Hot keys turn the local cache on
//! 4. With auto-degrade enabled and the distributed cache failed over, the
//!    local cache is forced on and the distributed cache off, regardless of
//!    hot-key status
//!
//! Enabled tiers are queried strictly in order and the first hit wins. A
//! miss or a cache-tier failure falls through to the next tier; only a
//! durable-storage fault is returned as an error.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::errors::{StoreError, StoreResult};
use crate::ports::{
    CapabilityProbe, FetchParams, PolicyConfig, Tier, TierFetch, TierReader, TierValue,
};
use crate::store::plan::TierPlan;

/// A single read against the tiered store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    pub key: String,
    /// Skip every cache and read durable storage directly
    pub force_durable: bool,
    pub params: FetchParams,
}

impl ReadRequest {
    pub fn new<K: Into<String>>(key: K) -> Self {
        Self { key: key.into(), force_durable: false, params: FetchParams::default() }
    }

    pub fn force_durable(mut self) -> Self {
        self.force_durable = true;
        self
    }

    pub fn with_params(mut self, params: FetchParams) -> Self {
        self.params = params;
        self
    }
}

/// Result of a tiered read
///
/// `NotFound` is a valid business outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found { value: TierValue, tier: Tier },
    NotFound,
}

impl ReadOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn value(&self) -> Option<&TierValue> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound => None,
        }
    }

    /// Tier that served the hit
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::Found { tier, .. } => Some(*tier),
            Self::NotFound => None,
        }
    }

    pub fn into_value(self) -> Option<TierValue> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound => None,
        }
    }
}

/// Orchestrator over local cache, distributed cache and durable storage
///
/// Holds only references to its collaborators; all mutable state lives in
/// the tier readers and their windows.
pub struct TieredStore {
    local_cache: Arc<dyn TierReader>,
    distributed_cache: Arc<dyn TierReader>,
    durable_storage: Arc<dyn TierReader>,
    distributed_probe: Arc<dyn CapabilityProbe>,
    policy: Arc<dyn PolicyConfig>,
}

impl std::fmt::Debug for TieredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStore")
            .field("local_cache", &self.local_cache.tier())
            .field("distributed_cache", &self.distributed_cache.tier())
            .field("durable_storage", &self.durable_storage.tier())
            .finish_non_exhaustive()
    }
}

impl TieredStore {
    pub fn builder() -> TieredStoreBuilder {
        TieredStoreBuilder::default()
    }

    /// Compute tier participation for `key`
    pub fn plan(&self, key: &str, force_durable: bool) -> TierPlan {
        if force_durable {
            return TierPlan::DURABLE_ONLY;
        }

        let mut plan = TierPlan::BASELINE;

        if self.policy.is_hot_key(key) {
            plan.local_cache = true;
        }

        if self.policy.is_auto_degrade_enabled() && self.distributed_probe.is_failed_over() {
            plan.local_cache = true;
            plan.distributed_cache = false;
            plan.degraded = true;
        }

        plan
    }

    /// Read `request.key` through the enabled tiers
    ///
    /// # Errors
    /// Returns `StoreError::Storage` or `StoreError::StorageTimeout` when
    /// durable storage is consulted and fails. Cache-tier failures are
    /// absorbed.
    #[instrument(skip(self, request), fields(key = %request.key, force_durable = request.force_durable))]
    pub async fn get(&self, request: &ReadRequest) -> StoreResult<ReadOutcome> {
        let plan = self.plan(&request.key, request.force_durable);
        if plan.degraded {
            debug!("Distributed cache failed over, degrading to local cache");
        }
        debug!(?plan, "Computed tier plan");

        for tier in plan.tiers() {
            match self.reader(tier).fetch(&request.key, &request.params).await {
                TierFetch::Hit(value) => {
                    debug!(%tier, "Tier hit");
                    return Ok(ReadOutcome::Found { value, tier });
                }
                TierFetch::Miss => trace!(%tier, "Tier miss"),
                TierFetch::Failed(err) if tier == Tier::DurableStorage => {
                    return Err(StoreError::from(err));
                }
                TierFetch::Failed(err) => {
                    debug!(%tier, error = %err, "Tier failed, falling through");
                }
            }
        }

        Ok(ReadOutcome::NotFound)
    }

    /// Read `key` with default options
    pub async fn get_key(&self, key: &str) -> StoreResult<ReadOutcome> {
        self.get(&ReadRequest::new(key)).await
    }

    fn reader(&self, tier: Tier) -> &Arc<dyn TierReader> {
        match tier {
            Tier::LocalCache => &self.local_cache,
            Tier::DistributedCache => &self.distributed_cache,
            Tier::DurableStorage => &self.durable_storage,
        }
    }
}

/// Builder for [`TieredStore`]
#[derive(Default)]
pub struct TieredStoreBuilder {
    local_cache: Option<Arc<dyn TierReader>>,
    distributed_cache: Option<Arc<dyn TierReader>>,
    durable_storage: Option<Arc<dyn TierReader>>,
    distributed_probe: Option<Arc<dyn CapabilityProbe>>,
    policy: Option<Arc<dyn PolicyConfig>>,
}

impl TieredStoreBuilder {
    pub fn local_cache(mut self, reader: Arc<dyn TierReader>) -> Self {
        self.local_cache = Some(reader);
        self
    }

    /// Distributed cache reader plus the probe that reports its health
    pub fn distributed_cache(
        mut self,
        reader: Arc<dyn TierReader>,
        probe: Arc<dyn CapabilityProbe>,
    ) -> Self {
        self.distributed_cache = Some(reader);
        self.distributed_probe = Some(probe);
        self
    }

    /// Distributed cache reader that is also its own probe
    pub fn self_probing_distributed_cache<R>(self, reader: Arc<R>) -> Self
    where
        R: TierReader + CapabilityProbe + 'static,
    {
        let probe: Arc<dyn CapabilityProbe> = reader.clone();
        self.distributed_cache(reader, probe)
    }

    pub fn durable_storage(mut self, reader: Arc<dyn TierReader>) -> Self {
        self.durable_storage = Some(reader);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn PolicyConfig>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// # Errors
    /// Returns `StoreError::MissingTier` for an unset tier and
    /// `StoreError::Config` when no policy was supplied.
    pub fn build(self) -> StoreResult<TieredStore> {
        let local_cache =
            self.local_cache.ok_or(StoreError::MissingTier { tier: Tier::LocalCache })?;
        let distributed_cache =
            self.distributed_cache.ok_or(StoreError::MissingTier { tier: Tier::DistributedCache })?;
        let durable_storage =
            self.durable_storage.ok_or(StoreError::MissingTier { tier: Tier::DurableStorage })?;
        let distributed_probe = self
            .distributed_probe
            .ok_or(StoreError::MissingTier { tier: Tier::DistributedCache })?;
        let policy = self.policy.ok_or_else(|| StoreError::config("policy source is required"))?;

        Ok(TieredStore { local_cache, distributed_cache, durable_storage, distributed_probe, policy })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct NoopReader(Tier);

    #[async_trait]
    impl TierReader for NoopReader {
        fn tier(&self) -> Tier {
            self.0
        }

        async fn fetch(&self, _key: &str, _params: &FetchParams) -> TierFetch {
            TierFetch::Miss
        }
    }

    struct Flags {
        hot: bool,
        degrade: bool,
    }

    impl PolicyConfig for Flags {
        fn is_hot_key(&self, _key: &str) -> bool {
            self.hot
        }

        fn is_auto_degrade_enabled(&self) -> bool {
            self.degrade
        }
    }

    struct CountingProbe {
        failed_over: AtomicBool,
        calls: AtomicUsize,
    }

    impl CapabilityProbe for CountingProbe {
        fn is_failed_over(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.failed_over.load(Ordering::SeqCst)
        }
    }

    fn store(hot: bool, degrade: bool, failed_over: bool) -> (TieredStore, Arc<CountingProbe>) {
        let probe = Arc::new(CountingProbe {
            failed_over: AtomicBool::new(failed_over),
            calls: AtomicUsize::new(0),
        });
        let store = TieredStore::builder()
            .local_cache(Arc::new(NoopReader(Tier::LocalCache)))
            .distributed_cache(Arc::new(NoopReader(Tier::DistributedCache)), probe.clone())
            .durable_storage(Arc::new(NoopReader(Tier::DurableStorage)))
            .policy(Arc::new(Flags { hot, degrade }))
            .build()
            .expect("complete store");
        (store, probe)
    }

    #[test]
    fn test_force_durable_overrides_flags() {
        let (store, probe) = store(true, true, true);
        assert_eq!(store.plan("k", true), TierPlan::DURABLE_ONLY);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_baseline_plan() {
        let (store, _) = store(false, false, false);
        assert_eq!(store.plan("k", false), TierPlan::BASELINE);
    }

    #[test]
    fn test_hot_key_enables_local_cache() {
        let (store, _) = store(true, false, false);
        let plan = store.plan("k", false);
        assert!(plan.local_cache && plan.distributed_cache && plan.durable_storage);
        assert!(!plan.degraded);
    }

    #[test]
    fn test_degrade_override() {
        let (store, _) = store(false, true, true);
        let plan = store.plan("k", false);
        assert!(plan.local_cache);
        assert!(!plan.distributed_cache);
        assert!(plan.durable_storage);
        assert!(plan.degraded);
    }

    #[test]
    fn test_probe_ignored_when_degrade_disabled() {
        let (store, probe) = store(true, false, true);
        let plan = store.plan("k", false);
        assert!(plan.distributed_cache);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_builder_reports_missing_tier() {
        let result = TieredStore::builder()
            .local_cache(Arc::new(NoopReader(Tier::LocalCache)))
            .durable_storage(Arc::new(NoopReader(Tier::DurableStorage)))
            .policy(Arc::new(Flags { hot: false, degrade: false }))
            .build();
        assert!(matches!(
            result,
            Err(StoreError::MissingTier { tier: Tier::DistributedCache })
        ));
    }

    #[test]
    fn test_read_outcome_accessors() {
        let found = ReadOutcome::Found {
            value: Arc::new(serde_json::json!(1)),
            tier: Tier::DurableStorage,
        };
        assert!(found.is_found());
        assert_eq!(found.tier(), Some(Tier::DurableStorage));
        assert!(ReadOutcome::NotFound.value().is_none());
    }
}
