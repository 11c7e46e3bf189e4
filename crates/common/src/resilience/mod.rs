//! Resilience primitives for the tiered read path
//!
//! - **Rolling window**: continuously decaying success/failure/timeout
//!   counters that health probes, breakers and alarm pollers can read cheaply
//!   from any thread
//! - **Single flight**: keyed coalescing of concurrent identical requests so
//!   a tier sees at most one in-flight fetch per key
//!
//! Both are generic library pieces; the tier-aware wiring lives in
//! `tierguard-core`.

pub mod rolling_window;
pub mod single_flight;

pub use rolling_window::{
    Outcome, RollingWindow, RollingWindowConfig, RollingWindowConfigBuilder, WindowError,
    WindowResult, WindowSnapshot, WindowState, DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_DURATION,
};
pub use single_flight::{Flight, SingleFlight};
