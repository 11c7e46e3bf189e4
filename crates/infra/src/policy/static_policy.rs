//! In-process policy source
//!
//! Holds hot keys and the auto-degrade flag in memory so an embedding
//! service can seed them from configuration and push remote updates at
//! runtime. Readers always see the latest write; there is no snapshot
//! across the two flags.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tierguard_core::{PolicyConfig, PolicySettings};

/// Runtime-updatable [`PolicyConfig`]
#[derive(Debug, Default)]
pub struct StaticPolicy {
    hot_keys: RwLock<HashSet<String>>,
    auto_degrade: AtomicBool,
}

impl StaticPolicy {
    pub fn new<I, K>(hot_keys: I, auto_degrade: bool) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            hot_keys: RwLock::new(hot_keys.into_iter().map(Into::into).collect()),
            auto_degrade: AtomicBool::new(auto_degrade),
        }
    }

    pub fn from_settings(settings: &PolicySettings) -> Self {
        Self::new(settings.hot_keys.iter().cloned(), settings.auto_degrade)
    }

    /// Returns `true` if the key was not already hot
    pub fn add_hot_key<K: Into<String>>(&self, key: K) -> bool {
        let key = key.into();
        let added = self.hot_keys.write().insert(key.clone());
        if added {
            tracing::debug!(%key, "Hot key added");
        }
        added
    }

    /// Returns `true` if the key was hot
    pub fn remove_hot_key(&self, key: &str) -> bool {
        let removed = self.hot_keys.write().remove(key);
        if removed {
            tracing::debug!(key, "Hot key removed");
        }
        removed
    }

    /// Swap the whole hot-key set atomically
    pub fn replace_hot_keys<I, K>(&self, hot_keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let next: HashSet<String> = hot_keys.into_iter().map(Into::into).collect();
        let count = next.len();
        *self.hot_keys.write() = next;
        tracing::info!(hot_keys = count, "Hot key set replaced");
    }

    pub fn set_auto_degrade(&self, enabled: bool) {
        let previous = self.auto_degrade.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            tracing::info!(enabled, "Auto-degrade toggled");
        }
    }

    pub fn hot_key_count(&self) -> usize {
        self.hot_keys.read().len()
    }
}

impl PolicyConfig for StaticPolicy {
    fn is_hot_key(&self, key: &str) -> bool {
        self.hot_keys.read().contains(key)
    }

    fn is_auto_degrade_enabled(&self) -> bool {
        self.auto_degrade.load(Ordering::Acquire)
    }
}
