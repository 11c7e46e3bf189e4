//! In-process local cache tier.
//!
//! Backs the local cache tier with a bounded, TTL-evicting moka cache. The
//! orchestrator only reads through it; the embedding service writes through
//! with [`MokaLocalCache::insert`] and [`MokaLocalCache::invalidate`].
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tierguard_infra::cache::MokaLocalCache;
//!
//! # async fn demo() {
//! let cache = MokaLocalCache::new(10_000, Duration::from_secs(30));
//! cache.insert("user:1", Arc::new(serde_json::json!({"name": "ada"}))).await;
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tierguard_core::{FetchParams, TierClient, TierClientError, TierValue};

/// Default maximum number of entries.
pub const DEFAULT_LOCAL_CAPACITY: u64 = 10_000;

/// Default time-to-live for local entries.
pub const DEFAULT_LOCAL_TTL: Duration = Duration::from_secs(30);

/// Local cache tier client over `moka::future::Cache`.
#[derive(Clone)]
pub struct MokaLocalCache {
    cache: Cache<String, TierValue>,
}

impl std::fmt::Debug for MokaLocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaLocalCache").field("entries", &self.cache.entry_count()).finish()
    }
}

impl Default for MokaLocalCache {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_CAPACITY, DEFAULT_LOCAL_TTL)
    }
}

impl MokaLocalCache {
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self { cache: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build() }
    }

    pub async fn insert<K: Into<String>>(&self, key: K, value: TierValue) {
        self.cache.insert(key.into(), value).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Approximate entry count; pending maintenance may lag behind writes.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl TierClient for MokaLocalCache {
    async fn get(
        &self,
        key: &str,
        _params: &FetchParams,
    ) -> Result<Option<TierValue>, TierClientError> {
        Ok(self.cache.get(key).await)
    }
}
