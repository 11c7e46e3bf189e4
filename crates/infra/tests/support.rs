use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tierguard_core::{FetchParams, TierClient, TierClientError, TierValue};

/// Map-backed tier client standing in for a remote cache or database.
///
/// Can be switched into a failing mode to simulate an outage.
#[derive(Default)]
pub struct InMemoryClient {
    entries: Mutex<HashMap<String, TierValue>>,
    failure: Mutex<Option<TierClientError>>,
    calls: AtomicUsize,
}

impl InMemoryClient {
    pub fn with_entry(self, key: &str, value: serde_json::Value) -> Self {
        self.entries.lock().unwrap().insert(key.to_string(), std::sync::Arc::new(value));
        self
    }

    pub fn fail_with(&self, error: Option<TierClientError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TierClient for InMemoryClient {
    async fn get(
        &self,
        key: &str,
        _params: &FetchParams,
    ) -> Result<Option<TierValue>, TierClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }
}
