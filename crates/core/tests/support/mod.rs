//! Shared test helpers for `tierguard-core` integration tests.
//!
//! Lightweight mocks for the read-path ports so the store scenarios can
//! focus on tier selection instead of boilerplate.

#![allow(dead_code)]

pub mod tiers;

pub use tiers::{MockPolicy, MockProbe, MockTierClient, RecordingReader};
