//! Error classification shared across tierguard crates
//!
//! Every error type in the workspace implements [`ErrorClassification`] so
//! that callers (retry loops, alarm pollers, log filters) can reason about a
//! failure without matching on crate-specific variants.
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Key not found in any tier |
//! | **Warning** | Degraded but operational | Cache tier timeout, tier rejected a read |
//! | **Error** | Failure requiring attention | Durable storage fault, invalid configuration |
//! | **Critical** | System integrity at risk | Background rotation task panicked |
//!
//! # Implementing for a module error
//!
//! ```rust
//! use std::time::Duration;
//!
//! use thiserror::Error;
//! use tierguard_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug, Error)]
//! enum LookupError {
//!     #[error("backend timed out after {0:?}")]
//!     Timeout(Duration),
//!     #[error("bad key: {0}")]
//!     BadKey(String),
//! }
//!
//! impl ErrorClassification for LookupError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Timeout(_))
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Timeout(_) => ErrorSeverity::Warning,
//!             Self::BadKey(_) => ErrorSeverity::Error,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(LookupError::Timeout(Duration::from_millis(5)).is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

/// Standard classification interface for errors
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as tier timeouts or a briefly unavailable backend.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for monitoring, alerting, and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
