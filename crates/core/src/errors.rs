//! Error types for tier clients and the tiered store

use std::time::Duration;

use thiserror::Error;
use tierguard_common::error::{ErrorClassification, ErrorSeverity};
use tierguard_common::resilience::{Outcome, WindowError};

use crate::ports::Tier;

/// Failure reported by an underlying tier client
///
/// Clients classify their own failures: a completed-but-rejected call is a
/// failure, a call with no response before its deadline is a timeout. The
/// classification feeds the tier's rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierClientError {
    /// The tier answered but refused or errored the request
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// The tier could not be reached
    #[error("Tier unavailable: {message}")]
    Unavailable { message: String },

    /// No response arrived within the deadline
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },
}

impl TierClientError {
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected { message: message.into() }
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Outcome kind recorded into the tier's rolling window
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Rejected { .. } | Self::Unavailable { .. } => Outcome::Failure,
            Self::Timeout { .. } => Outcome::Timeout,
        }
    }
}

impl ErrorClassification for TierClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Errors surfaced by the tiered store
///
/// Misses and cache-tier failures are absorbed by the fallthrough chain; only
/// a fault in durable storage (the tier of last resort) reaches the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Durable storage failed the read
    #[error("Durable storage fault: {message}")]
    Storage { message: String },

    /// Durable storage did not answer in time
    #[error("Durable storage timed out after {after:?}")]
    StorageTimeout { after: Duration },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The store was built without a required tier
    #[error("Tier not configured: {tier}")]
    MissingTier { tier: Tier },

    #[error(transparent)]
    Window(#[from] WindowError),
}

impl StoreError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }
}

impl From<TierClientError> for StoreError {
    fn from(err: TierClientError) -> Self {
        match err {
            TierClientError::Timeout { after } => Self::StorageTimeout { after },
            other => Self::Storage { message: other.to_string() },
        }
    }
}

impl ErrorClassification for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::StorageTimeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StorageTimeout { .. } => ErrorSeverity::Warning,
            Self::Storage { .. } | Self::Config { .. } | Self::MissingTier { .. } => {
                ErrorSeverity::Error
            }
            Self::Window(err) => err.severity(),
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Window(err) => err.is_critical(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Result type alias for tiered store operations
pub type StoreResult<T> = Result<T, StoreError>;
