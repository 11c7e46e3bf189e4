//! Window-derived capability probe

use std::sync::Arc;

use tierguard_common::resilience::RollingWindow;
use tracing::trace;

use crate::config::ProbeSettings;
use crate::ports::CapabilityProbe;

/// Reports fail-over once a tier's recent error rate crosses a threshold
///
/// The probe stays healthy until the window holds at least `min_samples`
/// outcomes, so a single early failure cannot trip it.
#[derive(Debug, Clone)]
pub struct ErrorRateProbe {
    window: Arc<RollingWindow>,
    threshold: f64,
    min_samples: u64,
}

impl ErrorRateProbe {
    pub fn new(window: Arc<RollingWindow>, settings: &ProbeSettings) -> Self {
        Self { window, threshold: settings.error_rate_threshold, min_samples: settings.min_samples }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_samples(&self) -> u64 {
        self.min_samples
    }
}

impl CapabilityProbe for ErrorRateProbe {
    fn is_failed_over(&self) -> bool {
        let snapshot = self.window.snapshot();
        if snapshot.total() < self.min_samples {
            return false;
        }
        let error_rate = snapshot.error_rate();
        trace!(error_rate, total = snapshot.total(), "Probe evaluated tier health");
        // A window with no errors is healthy whatever the threshold.
        error_rate > 0.0 && error_rate >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use tierguard_common::resilience::RollingWindowConfig;

    use super::*;

    fn probe(threshold: f64, min_samples: u64) -> (Arc<RollingWindow>, ErrorRateProbe) {
        let window = Arc::new(
            RollingWindow::detached(RollingWindowConfig::default()).expect("detached window"),
        );
        let settings = ProbeSettings { error_rate_threshold: threshold, min_samples };
        let probe = ErrorRateProbe::new(Arc::clone(&window), &settings);
        (window, probe)
    }

    #[test]
    fn test_healthy_below_min_samples() {
        let (window, probe) = probe(0.5, 10);
        for _ in 0..9 {
            window.record_failure();
        }
        assert!(!probe.is_failed_over());
        window.record_failure();
        assert!(probe.is_failed_over());
    }

    #[test]
    fn test_threshold_counts_timeouts() {
        let (window, probe) = probe(0.5, 4);
        window.record_success();
        window.record_success();
        window.record_success();
        window.record_timeout();
        assert!(!probe.is_failed_over());

        window.record_timeout();
        window.record_timeout();
        assert!(probe.is_failed_over());
    }

    #[test]
    fn test_error_free_window_is_healthy_at_zero_threshold() {
        let (window, probe) = probe(0.0, 1);
        window.record_success();
        assert!(!probe.is_failed_over());

        window.record_failure();
        assert!(probe.is_failed_over());
    }

    #[test]
    fn test_empty_window_is_healthy() {
        let (_window, probe) = probe(0.1, 0);
        assert!(!probe.is_failed_over());
    }
}
