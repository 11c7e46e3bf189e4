use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tierguard_core::{
    CapabilityProbe, FetchParams, PolicyConfig, Tier, TierClient, TierClientError, TierFetch,
    TierReader, TierValue,
};
use tokio::sync::Semaphore;

/// Tier reader returning a fixed response and counting fetches.
pub struct RecordingReader {
    tier: Tier,
    response: Mutex<TierFetch>,
    fetches: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl RecordingReader {
    pub fn new(tier: Tier, response: TierFetch) -> Arc<Self> {
        Arc::new(Self {
            tier,
            response: Mutex::new(response),
            fetches: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        })
    }

    pub fn miss(tier: Tier) -> Arc<Self> {
        Self::new(tier, TierFetch::Miss)
    }

    pub fn hit(tier: Tier, value: serde_json::Value) -> Arc<Self> {
        Self::new(tier, TierFetch::Hit(Arc::new(value)))
    }

    pub fn failing(tier: Tier, error: TierClientError) -> Arc<Self> {
        Self::new(tier, TierFetch::Failed(error))
    }

    /// Replace the response returned by subsequent fetches.
    pub fn respond_with(&self, response: TierFetch) {
        *self.response.lock().unwrap() = response;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fetched_keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl TierReader for RecordingReader {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn fetch(&self, key: &str, _params: &FetchParams) -> TierFetch {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.to_string());
        self.response.lock().unwrap().clone()
    }
}

/// Mutable policy source.
#[derive(Default)]
pub struct MockPolicy {
    hot_keys: Mutex<HashSet<String>>,
    auto_degrade: AtomicBool,
}

impl MockPolicy {
    pub fn new(hot_keys: &[&str], auto_degrade: bool) -> Arc<Self> {
        Arc::new(Self {
            hot_keys: Mutex::new(hot_keys.iter().map(|key| (*key).to_string()).collect()),
            auto_degrade: AtomicBool::new(auto_degrade),
        })
    }

    pub fn set_auto_degrade(&self, enabled: bool) {
        self.auto_degrade.store(enabled, Ordering::SeqCst);
    }
}

impl PolicyConfig for MockPolicy {
    fn is_hot_key(&self, key: &str) -> bool {
        self.hot_keys.lock().unwrap().contains(key)
    }

    fn is_auto_degrade_enabled(&self) -> bool {
        self.auto_degrade.load(Ordering::SeqCst)
    }
}

/// Fail-over flag that counts how often it was consulted.
#[derive(Default)]
pub struct MockProbe {
    failed_over: AtomicBool,
    checks: AtomicUsize,
}

impl MockProbe {
    pub fn new(failed_over: bool) -> Arc<Self> {
        Arc::new(Self { failed_over: AtomicBool::new(failed_over), checks: AtomicUsize::new(0) })
    }

    pub fn set_failed_over(&self, failed_over: bool) {
        self.failed_over.store(failed_over, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl CapabilityProbe for MockProbe {
    fn is_failed_over(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.failed_over.load(Ordering::SeqCst)
    }
}

/// Tier client that blocks on a semaphore until the test releases it.
pub struct MockTierClient {
    response: Result<Option<TierValue>, TierClientError>,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl MockTierClient {
    /// Client whose calls block until [`MockTierClient::release`].
    pub fn gated(response: Result<Option<TierValue>, TierClientError>) -> Arc<Self> {
        Arc::new(Self { response, gate: Semaphore::new(0), calls: AtomicUsize::new(0) })
    }

    /// Client whose calls complete immediately.
    pub fn open(response: Result<Option<TierValue>, TierClientError>) -> Arc<Self> {
        let client = Self::gated(response);
        client.gate.add_permits(1 << 20);
        client
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TierClient for MockTierClient {
    async fn get(
        &self,
        _key: &str,
        _params: &FetchParams,
    ) -> Result<Option<TierValue>, TierClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await.expect("gate closed");
        self.response.clone()
    }
}
