//! Tier client adapters

pub mod local;

pub use local::{MokaLocalCache, DEFAULT_LOCAL_CAPACITY, DEFAULT_LOCAL_TTL};
