//! Port interfaces for the tiered read path
//!
//! These traits define the boundaries between the orchestration policy and
//! the collaborators it consumes: tier clients, health probes and the
//! remote configuration source.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tierguard_common::resilience::Outcome;

use crate::errors::TierClientError;

/// Value stored in a tier; cheap to clone across coalesced callers
pub type TierValue = Arc<Value>;

/// One layer of the read path, ordered cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// In-process cache
    LocalCache,
    /// Shared cache cluster
    DistributedCache,
    /// Source of truth; tier of last resort
    DurableStorage,
}

impl Tier {
    /// All tiers in query order
    pub const ALL: [Self; 3] = [Self::LocalCache, Self::DistributedCache, Self::DurableStorage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalCache => "local_cache",
            Self::DistributedCache => "distributed_cache",
            Self::DurableStorage => "durable_storage",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque per-request parameters passed through to tier clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchParams(Map<String, Value>);

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style)
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of one tier fetch
#[derive(Debug, Clone, PartialEq)]
pub enum TierFetch {
    /// The tier holds the key
    Hit(TierValue),
    /// The tier answered and does not hold the key
    Miss,
    /// The tier failed or timed out
    Failed(TierClientError),
}

impl TierFetch {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn value(&self) -> Option<&TierValue> {
        match self {
            Self::Hit(value) => Some(value),
            _ => None,
        }
    }

    /// Outcome kind recorded into the tier's rolling window
    ///
    /// A clean miss means the tier is healthy, so it counts as a success.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Hit(_) | Self::Miss => Outcome::Success,
            Self::Failed(err) => err.outcome(),
        }
    }
}

impl From<Result<Option<TierValue>, TierClientError>> for TierFetch {
    fn from(result: Result<Option<TierValue>, TierClientError>) -> Self {
        match result {
            Ok(Some(value)) => Self::Hit(value),
            Ok(None) => Self::Miss,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Underlying client of a single tier (cache driver, database client, ...)
#[async_trait]
pub trait TierClient: Send + Sync {
    /// Look up `key`; `Ok(None)` is a miss
    async fn get(
        &self,
        key: &str,
        params: &FetchParams,
    ) -> Result<Option<TierValue>, TierClientError>;
}

/// Keyed reader for one tier, consumed by the orchestrator
///
/// Implementations coalesce concurrent fetches of the same key and never
/// fail on their own: client errors come back as [`TierFetch::Failed`].
#[async_trait]
pub trait TierReader: Send + Sync {
    /// Tier served by this reader
    fn tier(&self) -> Tier;

    async fn fetch(&self, key: &str, params: &FetchParams) -> TierFetch;
}

/// Health signal reported by a tier
pub trait CapabilityProbe: Send + Sync {
    /// `true` while the tier is failing over and should be bypassed
    fn is_failed_over(&self) -> bool;
}

/// Dynamic flags supplied by the remote configuration system
///
/// Values may change between calls; no snapshot guarantee is expected.
pub trait PolicyConfig: Send + Sync {
    /// Whether `key` is flagged hot and should be served from the local cache
    fn is_hot_key(&self, key: &str) -> bool;

    /// Whether distributed-cache auto-degrade is enabled
    fn is_auto_degrade_enabled(&self) -> bool;
}
