//! Logging setup for binaries embedding the tiered store
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! the embedding process's call. `RUST_LOG` takes precedence over the
//! fallback directive passed to [`init_tracing`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default directive used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tierguard_core=info,tierguard_common=info";

/// Install a global fmt subscriber
///
/// Returns `false` if a global subscriber was already installed, which
/// makes repeated calls from tests harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
