//! Coalescing tier reader
//!
//! Wraps a [`TierClient`] so that concurrent fetches of one key share a
//! single underlying call, and records the outcome of every underlying call
//! (not every caller) into the tier's rolling window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tierguard_common::resilience::{RollingWindow, SingleFlight};
use tracing::{debug, warn};

use crate::config::{ProbeSettings, ResilienceConfig};
use crate::errors::{StoreResult, TierClientError};
use crate::ports::{CapabilityProbe, FetchParams, Tier, TierClient, TierFetch, TierReader};
use crate::tier::probe::ErrorRateProbe;

/// Tier reader with single-flight coalescing and outcome accounting
pub struct CoalescingTierReader {
    tier: Tier,
    client: Arc<dyn TierClient>,
    flights: SingleFlight<String, TierFetch>,
    window: Arc<RollingWindow>,
    probe: ErrorRateProbe,
    fetch_timeout: Option<Duration>,
}

impl std::fmt::Debug for CoalescingTierReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingTierReader")
            .field("tier", &self.tier)
            .field("window", &self.window)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl CoalescingTierReader {
    /// Create a reader around an existing window with default probe settings
    pub fn new(tier: Tier, client: Arc<dyn TierClient>, window: Arc<RollingWindow>) -> Self {
        let probe = ErrorRateProbe::new(Arc::clone(&window), &ProbeSettings::default());
        Self { tier, client, flights: SingleFlight::new(), window, probe, fetch_timeout: None }
    }

    /// Build a reader with a running window from configuration
    ///
    /// # Errors
    /// Returns `StoreError::Config` if any section of `config` is invalid,
    /// or an error if no tokio runtime is available.
    pub fn from_config(
        tier: Tier,
        client: Arc<dyn TierClient>,
        config: &ResilienceConfig,
    ) -> StoreResult<Self> {
        config.validate()?;
        let window = Arc::new(RollingWindow::with_config(config.window.to_window_config()?)?);
        let reader = Self::new(tier, client, window).with_probe(&config.probe);
        Ok(match config.reader.fetch_timeout() {
            Some(limit) => reader.with_fetch_timeout(limit),
            None => reader,
        })
    }

    /// Replace the probe thresholds
    pub fn with_probe(mut self, settings: &ProbeSettings) -> Self {
        self.probe = ErrorRateProbe::new(Arc::clone(&self.window), settings);
        self
    }

    /// Bound each underlying fetch; expiry is classified as a timeout
    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = Some(limit);
        self
    }

    /// Outcome window of this tier
    pub fn window(&self) -> &Arc<RollingWindow> {
        &self.window
    }

    pub fn probe(&self) -> &ErrorRateProbe {
        &self.probe
    }

    /// Stop the window's background rotation
    pub async fn shutdown(&self) -> StoreResult<()> {
        self.window.stop().await?;
        Ok(())
    }
}

#[async_trait]
impl TierReader for CoalescingTierReader {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn fetch(&self, key: &str, params: &FetchParams) -> TierFetch {
        let tier = self.tier;
        let client = Arc::clone(&self.client);
        let window = Arc::clone(&self.window);
        let fetch_timeout = self.fetch_timeout;
        let owned_key = key.to_string();
        let params = params.clone();

        let flight = self
            .flights
            .run(key.to_string(), move || async move {
                let call = client.get(&owned_key, &params);
                let result = match fetch_timeout {
                    Some(limit) => tokio::time::timeout(limit, call)
                        .await
                        .unwrap_or_else(|_| Err(TierClientError::timeout(limit))),
                    None => call.await,
                };

                let fetch = TierFetch::from(result);
                window.record(fetch.outcome());
                if let TierFetch::Failed(err) = &fetch {
                    warn!(%tier, key = %owned_key, error = %err, outcome = %err.outcome(), "Tier fetch failed");
                }
                fetch
            })
            .await;

        if flight.shared {
            debug!(%tier, key, "Joined in-flight tier fetch");
        }
        flight.value
    }
}

impl CapabilityProbe for CoalescingTierReader {
    fn is_failed_over(&self) -> bool {
        self.probe.is_failed_over()
    }
}
