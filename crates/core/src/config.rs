//! Resilience configuration
//!
//! Serde-backed settings for windows, probes, tier readers and the static
//! policy. Every field has a default so partial files deserialize cleanly;
//! loading from the environment or disk lives in `tierguard-infra`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tierguard_common::resilience::{
    RollingWindowConfig, WindowResult, DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_DURATION,
};

use crate::errors::{StoreError, StoreResult};

/// Default error rate at which a tier is considered failed over
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.5;

/// Default minimum number of outcomes before the probe may trip
pub const DEFAULT_MIN_SAMPLES: u64 = 20;

/// Top-level configuration for a tiered store deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub window: WindowSettings,
    pub probe: ProbeSettings,
    pub reader: ReaderSettings,
    pub policy: PolicySettings,
}

impl ResilienceConfig {
    /// Validate all sections
    ///
    /// # Errors
    /// Returns `StoreError::Config` naming the first offending field.
    pub fn validate(&self) -> StoreResult<()> {
        self.window.to_window_config().map_err(|err| StoreError::config(err.to_string()))?;
        self.probe.validate()?;
        if self.reader.fetch_timeout_ms == Some(0) {
            return Err(StoreError::config("reader.fetch_timeout_ms must be greater than 0"));
        }
        Ok(())
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            bucket_duration_ms = self.window.bucket_duration_ms,
            bucket_count = self.window.bucket_count,
            error_rate_threshold = self.probe.error_rate_threshold,
            min_samples = self.probe.min_samples,
            fetch_timeout_ms = ?self.reader.fetch_timeout_ms,
            hot_keys = self.policy.hot_keys.len(),
            auto_degrade = self.policy.auto_degrade,
            "Resilience configuration loaded"
        );
    }
}

/// Rolling window layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub bucket_duration_ms: u64,
    pub bucket_count: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            bucket_duration_ms: u64::try_from(DEFAULT_BUCKET_DURATION.as_millis()).unwrap_or(50),
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

impl WindowSettings {
    /// Convert into a validated [`RollingWindowConfig`]
    pub fn to_window_config(&self) -> WindowResult<RollingWindowConfig> {
        RollingWindowConfig::builder()
            .bucket_duration(Duration::from_millis(self.bucket_duration_ms))
            .bucket_count(self.bucket_count)
            .build()
    }
}

/// Error-rate probe thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Error rate in `(0, 1]` at or above which the tier is failed over
    pub error_rate_threshold: f64,
    /// Outcomes required in the window before the threshold applies
    pub min_samples: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self { error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD, min_samples: DEFAULT_MIN_SAMPLES }
    }
}

impl ProbeSettings {
    pub fn validate(&self) -> StoreResult<()> {
        if !(self.error_rate_threshold > 0.0 && self.error_rate_threshold <= 1.0) {
            return Err(StoreError::config(format!(
                "probe.error_rate_threshold must be in (0, 1], got {}",
                self.error_rate_threshold
            )));
        }
        Ok(())
    }
}

/// Tier reader behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Bound on each underlying fetch; expiry is recorded as a timeout
    pub fetch_timeout_ms: Option<u64>,
}

impl ReaderSettings {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

/// Initial values for the static policy source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub hot_keys: Vec<String>,
    pub auto_degrade: bool,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self { hot_keys: Vec::new(), auto_degrade: true }
    }
}
