//! # TierGuard Infrastructure
//!
//! Infrastructure implementations of the `tierguard-core` ports.
//!
//! This crate provides:
//! - Configuration loading from environment variables and files
//! - An in-process, runtime-updatable policy source
//! - A moka-backed local cache tier client
//! - Tracing subscriber setup for embedding binaries

pub mod cache;
pub mod config;
pub mod observability;
pub mod policy;

pub use cache::MokaLocalCache;
pub use observability::init_tracing;
pub use policy::StaticPolicy;
