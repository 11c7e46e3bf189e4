//! Rolling time-window outcome counters
//!
//! Time is quantized into fixed-duration buckets arranged in a ring of
//! `bucket_count + 2` slots. Each bucket counts successes, failures and
//! timeouts. A background task advances the ring once per bucket duration:
//! the vacated bucket is folded into a carried-forward aggregate and, once the
//! window has warmed up, the bucket falling out of the retention span is
//! subtracted from it again.
//!
//! Reads and increments take a shared lock and touch only atomics, so any
//! number of callers can record and query concurrently. Rotation takes the
//! exclusive lock for its short critical section, which keeps the
//! `(latest, oldest, carried)` triple consistent for readers.
//!
//! The two padding slots keep the slot being zeroed for reuse away from the
//! oldest retained slot, so a rotation never subtracts a half-reset bucket.
//! The reported span is therefore approximate: a value recorded into the
//! current bucket stays visible for fewer than `bucket_count` rotations.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tierguard_common::resilience::{RollingWindow, RollingWindowConfig};
//!
//! # fn main() -> Result<(), tierguard_common::resilience::WindowError> {
//! let config = RollingWindowConfig::builder()
//!     .bucket_duration(Duration::from_millis(100))
//!     .bucket_count(10)
//!     .build()?;
//!
//! // A detached window is rotated by its owner instead of a background task.
//! let window = RollingWindow::detached(config)?;
//! window.record_success();
//! window.record_timeout();
//! assert_eq!(window.success_count(), 1);
//! assert!((window.error_rate() - 0.5).abs() < f64::EPSILON);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{ErrorClassification, ErrorSeverity};

/// Default duration of a single bucket
pub const DEFAULT_BUCKET_DURATION: Duration = Duration::from_millis(50);

/// Default number of retained buckets (a ~5 second span at the default
/// bucket duration)
pub const DEFAULT_BUCKET_COUNT: usize = 100;

/// Extra ring slots separating the write cursor from the oldest cursor
const RING_PADDING: usize = 2;

//==============================================================================
// Error Types
//==============================================================================

/// Errors raised while building or stopping a rolling window
#[derive(Debug, Error)]
pub enum WindowError {
    /// Configuration values are out of range
    #[error("Invalid window configuration: {message}")]
    InvalidConfig { message: String },

    /// A running window was requested outside of a tokio runtime
    #[error("No tokio runtime available to drive window rotation")]
    NoRuntime,

    /// The rotation task panicked or was aborted before it could be joined
    #[error("Rotation task failed to join: {message}")]
    RotationJoin { message: String },
}

/// Result type for rolling window operations
pub type WindowResult<T> = Result<T, WindowError>;

impl ErrorClassification for WindowError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidConfig { .. } | Self::NoRuntime => ErrorSeverity::Error,
            Self::RotationJoin { .. } => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::RotationJoin { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

//==============================================================================
// Configuration
//==============================================================================

/// Bucket layout of a rolling window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingWindowConfig {
    /// Duration covered by one bucket; also the rotation period
    pub bucket_duration: Duration,
    /// Number of buckets retained in the reporting span
    pub bucket_count: usize,
}

impl Default for RollingWindowConfig {
    fn default() -> Self {
        Self { bucket_duration: DEFAULT_BUCKET_DURATION, bucket_count: DEFAULT_BUCKET_COUNT }
    }
}

impl RollingWindowConfig {
    /// Create a configuration builder starting from the defaults
    pub fn builder() -> RollingWindowConfigBuilder {
        RollingWindowConfigBuilder::default()
    }

    /// Nominal reporting span (`bucket_duration * bucket_count`)
    pub fn span(&self) -> Duration {
        let count = u32::try_from(self.bucket_count).unwrap_or(u32::MAX);
        self.bucket_duration.saturating_mul(count)
    }

    /// Validate the configuration
    pub fn validate(&self) -> WindowResult<()> {
        if self.bucket_count == 0 {
            return Err(WindowError::InvalidConfig {
                message: "bucket_count must be greater than 0".to_string(),
            });
        }

        if self.bucket_duration.is_zero() {
            return Err(WindowError::InvalidConfig {
                message: "bucket_duration must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`RollingWindowConfig`]
#[derive(Debug, Default)]
pub struct RollingWindowConfigBuilder {
    config: RollingWindowConfig,
}

impl RollingWindowConfigBuilder {
    /// Set the time slice covered by one bucket
    pub fn bucket_duration(mut self, duration: Duration) -> Self {
        self.config.bucket_duration = duration;
        self
    }

    /// Set the number of retained buckets
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.config.bucket_count = count;
        self
    }

    /// Validate and return the configuration
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidConfig`] for a zero duration or count.
    pub fn build(self) -> WindowResult<RollingWindowConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//==============================================================================
// Buckets and snapshots
//==============================================================================

/// Classification of a single call outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The call completed normally
    Success,
    /// The call completed but was rejected or errored
    Failure,
    /// No response arrived within the deadline
    Timeout,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// One time slice of outcome counters
#[derive(Debug, Default)]
struct Bucket {
    success: AtomicU64,
    failure: AtomicU64,
    timeout: AtomicU64,
}

impl Bucket {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Success => &self.success,
            Outcome::Failure => &self.failure,
            Outcome::Timeout => &self.timeout,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn counts(&self) -> WindowSnapshot {
        WindowSnapshot {
            success: self.success.load(Ordering::Acquire),
            failure: self.failure.load(Ordering::Acquire),
            timeout: self.timeout.load(Ordering::Acquire),
        }
    }

    fn reset(&self) {
        self.success.store(0, Ordering::Release);
        self.failure.store(0, Ordering::Release);
        self.timeout.store(0, Ordering::Release);
    }
}

/// Point-in-time aggregate of a window's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub success: u64,
    pub failure: u64,
    pub timeout: u64,
}

impl WindowSnapshot {
    /// Total number of recorded outcomes
    pub fn total(&self) -> u64 {
        self.success.saturating_add(self.failure).saturating_add(self.timeout)
    }

    /// `success / total`, or `0.0` when nothing was recorded
    pub fn success_rate(&self) -> f64 {
        ratio(self.success, self.total())
    }

    /// `(failure + timeout) / total`, or `0.0` when nothing was recorded
    pub fn error_rate(&self) -> f64 {
        ratio(self.failure.saturating_add(self.timeout), self.total())
    }

    fn plus(self, other: Self) -> Self {
        Self {
            success: self.success.saturating_add(other.success),
            failure: self.failure.saturating_add(other.failure),
            timeout: self.timeout.saturating_add(other.timeout),
        }
    }

    fn minus(self, other: Self) -> Self {
        Self {
            success: self.success.saturating_sub(other.success),
            failure: self.failure.saturating_sub(other.failure),
            timeout: self.timeout.saturating_sub(other.timeout),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}

//==============================================================================
// Ring
//==============================================================================

/// Bucket ring plus cursors; guarded by the window's `RwLock`
#[derive(Debug)]
struct Ring {
    buckets: Box<[Bucket]>,
    bucket_count: usize,
    latest: usize,
    oldest: usize,
    warming_up: bool,
    /// Sum of the buckets in `[oldest, latest)`
    carried: WindowSnapshot,
    rotations: u64,
}

impl Ring {
    fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count + RING_PADDING).map(|_| Bucket::default()).collect();
        Self {
            buckets,
            bucket_count,
            latest: 0,
            oldest: 0,
            warming_up: true,
            carried: WindowSnapshot::default(),
            rotations: 0,
        }
    }

    fn current(&self) -> &Bucket {
        &self.buckets[self.latest]
    }

    fn totals(&self) -> WindowSnapshot {
        self.current().counts().plus(self.carried)
    }

    fn rotate(&mut self) {
        let len = self.buckets.len();

        self.carried = self.carried.plus(self.buckets[self.latest].counts());
        self.latest += 1;
        if self.warming_up && self.latest >= self.bucket_count {
            self.warming_up = false;
        }
        if self.latest >= len {
            self.latest -= len;
        }
        self.buckets[self.latest].reset();

        if !self.warming_up {
            self.carried = self.carried.minus(self.buckets[self.oldest].counts());
            self.oldest += 1;
            if self.oldest >= len {
                self.oldest -= len;
            }
        }

        self.rotations = self.rotations.wrapping_add(1);
    }
}

//==============================================================================
// Window
//==============================================================================

/// Lifecycle state of a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Background rotation is active
    Running,
    /// Rotation was halted by [`RollingWindow::stop`]; counters are frozen
    Stopped,
    /// No background task; the owner drives [`RollingWindow::rotate`]
    Detached,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Detached => write!(f, "DETACHED"),
        }
    }
}

struct RotationTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Continuously decaying success/failure/timeout statistics
///
/// See the [module documentation](self) for the rotation algorithm.
pub struct RollingWindow {
    config: RollingWindowConfig,
    ring: Arc<RwLock<Ring>>,
    rotation: Mutex<Option<RotationTask>>,
    state: Mutex<WindowState>,
}

impl fmt::Debug for RollingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingWindow")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl RollingWindow {
    /// Start a window with the default layout (50ms x 100 buckets)
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NoRuntime`] when called outside a tokio runtime.
    pub fn new() -> WindowResult<Self> {
        Self::with_config(RollingWindowConfig::default())
    }

    /// Start a window whose rotation task runs on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no runtime is
    /// available.
    pub fn with_config(config: RollingWindowConfig) -> WindowResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| WindowError::NoRuntime)?;

        let ring = Arc::new(RwLock::new(Ring::new(config.bucket_count)));
        let cancel = CancellationToken::new();
        let handle = runtime.spawn(Self::rotation_loop(
            Arc::clone(&ring),
            config.bucket_duration,
            cancel.clone(),
        ));

        info!(
            bucket_duration_ms = u64::try_from(config.bucket_duration.as_millis()).unwrap_or(u64::MAX),
            bucket_count = config.bucket_count,
            "Rolling window started"
        );

        Ok(Self {
            config,
            ring,
            rotation: Mutex::new(Some(RotationTask { cancel, handle })),
            state: Mutex::new(WindowState::Running),
        })
    }

    /// Build a window without a rotation task
    ///
    /// The owner advances the window by calling [`rotate`](Self::rotate).
    pub fn detached(config: RollingWindowConfig) -> WindowResult<Self> {
        config.validate()?;
        Ok(Self {
            ring: Arc::new(RwLock::new(Ring::new(config.bucket_count))),
            config,
            rotation: Mutex::new(None),
            state: Mutex::new(WindowState::Detached),
        })
    }

    async fn rotation_loop(ring: Arc<RwLock<Ring>>, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Rolling window rotation cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let mut ring = ring.write();
                    ring.rotate();
                    trace!(latest = ring.latest, oldest = ring.oldest, "Rolling window rotated");
                }
            }
        }
    }

    /// Window layout
    pub fn config(&self) -> &RollingWindowConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> WindowState {
        *self.state.lock()
    }

    /// Number of rotations performed so far
    pub fn rotations(&self) -> u64 {
        self.ring.read().rotations
    }

    /// Advance the window by one bucket
    pub fn rotate(&self) {
        self.ring.write().rotate();
    }

    /// Halt background rotation and wait for the task to finish
    ///
    /// Counters keep their last values and remain readable. Calling `stop`
    /// again, or on a detached window, does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::RotationJoin`] if the rotation task panicked.
    pub async fn stop(&self) -> WindowResult<()> {
        let task = self.rotation.lock().take();
        let Some(task) = task else {
            return Ok(());
        };

        task.cancel.cancel();
        *self.state.lock() = WindowState::Stopped;

        task.handle.await.map_err(|err| {
            warn!(error = %err, "Rolling window rotation task did not shut down cleanly");
            WindowError::RotationJoin { message: err.to_string() }
        })?;

        debug!(rotations = self.rotations(), "Rolling window stopped");
        Ok(())
    }

    /// Record an outcome into the current bucket
    pub fn record(&self, outcome: Outcome) {
        self.ring.read().current().record(outcome);
    }

    pub fn record_success(&self) {
        self.record(Outcome::Success);
    }

    pub fn record_failure(&self) {
        self.record(Outcome::Failure);
    }

    pub fn record_timeout(&self) {
        self.record(Outcome::Timeout);
    }

    /// Consistent view of all three counters
    pub fn snapshot(&self) -> WindowSnapshot {
        self.ring.read().totals()
    }

    pub fn success_count(&self) -> u64 {
        self.snapshot().success
    }

    pub fn failure_count(&self) -> u64 {
        self.snapshot().failure
    }

    pub fn timeout_count(&self) -> u64 {
        self.snapshot().timeout
    }

    /// `success / total`; `0.0` for an empty window
    pub fn success_rate(&self) -> f64 {
        self.snapshot().success_rate()
    }

    /// `(failure + timeout) / total`; `0.0` for an empty window
    pub fn error_rate(&self) -> f64 {
        self.snapshot().error_rate()
    }
}

impl Drop for RollingWindow {
    fn drop(&mut self) {
        if let Some(task) = self.rotation.get_mut().take() {
            task.cancel.cancel();
        }
    }
}
