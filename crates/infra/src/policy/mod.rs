//! Policy sources for the tiered store

pub mod static_policy;

pub use static_policy::StaticPolicy;
