//! Keyed request coalescing
//!
//! A [`SingleFlight`] group guarantees that concurrent callers asking for the
//! same key share one execution of the underlying work. The first caller (the
//! leader) supplies the future; callers arriving while it is in flight wait
//! on a shared handle and receive a clone of its output.
//!
//! Entries are reference counted by their waiters and removed as soon as the
//! work completes, so a caller arriving after completion starts a fresh
//! execution. If every waiter is dropped before completion the entry (and
//! the unfinished work) is discarded.
//!
//! Coalesced callers may observe a result produced for another caller's
//! parameters. Only use the group for idempotent reads.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type SharedCall<V> = Shared<BoxFuture<'static, V>>;

struct Call<V>
where
    V: Clone,
{
    future: SharedCall<V>,
    waiters: usize,
}

/// Result of a coalesced execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight<V> {
    /// Output of the underlying work
    pub value: V,
    /// `true` when this caller joined work started by another caller
    pub shared: bool,
}

/// Registry of in-flight work keyed by `K`
pub struct SingleFlight<K, V>
where
    V: Clone,
{
    calls: Mutex<HashMap<K, Call<V>>>,
}

impl<K, V> fmt::Debug for SingleFlight<K, V>
where
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight").field("in_flight", &self.calls.lock().len()).finish()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { calls: Mutex::new(HashMap::new()) }
    }

    /// Run `work` for `key`, or join the execution already in flight
    ///
    /// `work` is only invoked when this caller becomes the leader, and only
    /// once the registry lock has been released.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> Flight<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        let (future, shared) = {
            let mut calls = self.calls.lock();
            if let Some(call) = calls.get_mut(&key) {
                call.waiters += 1;
                (call.future.clone(), true)
            } else {
                let future = async move { work().await }.boxed().shared();
                calls.insert(key.clone(), Call { future: future.clone(), waiters: 1 });
                (future, false)
            }
        };

        let mut guard = WaiterGuard { calls: &self.calls, key, future: future.clone(), done: false };
        let value = future.await;
        guard.done = true;
        drop(guard);

        Flight { value, shared }
    }

    /// Number of keys with work in flight
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of callers currently waiting on `key`
    pub fn waiters(&self, key: &K) -> usize {
        self.calls.lock().get(key).map_or(0, |call| call.waiters)
    }
}

/// Releases a waiter's reference when its `run` future finishes or is dropped
struct WaiterGuard<'a, K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    calls: &'a Mutex<HashMap<K, Call<V>>>,
    key: K,
    future: SharedCall<V>,
    done: bool,
}

impl<K, V> Drop for WaiterGuard<'_, K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn drop(&mut self) {
        let mut calls = self.calls.lock();
        let remove = match calls.get_mut(&self.key) {
            // A newer execution may already occupy the slot.
            Some(call) if call.future.ptr_eq(&self.future) => {
                call.waiters = call.waiters.saturating_sub(1);
                self.done || call.waiters == 0
            }
            _ => false,
        };
        if remove {
            calls.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_single_caller_runs_work() {
        let group: SingleFlight<String, u32> = SingleFlight::new();
        let flight = group.run("a".to_string(), || async { 7 }).await;

        assert_eq!(flight, Flight { value: 7, shared: false });
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sequential_calls_do_not_share() {
        let group: SingleFlight<&'static str, usize> = SingleFlight::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let counter = Arc::clone(&invocations);
            let flight = group
                .run("key", move || async move { counter.fetch_add(1, Ordering::SeqCst) + 1 })
                .await;
            assert_eq!(flight.value, expected);
            assert!(!flight.shared);
        }
        assert_eq!(invocations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_work_runs_outside_registry_lock() {
        let group: Arc<SingleFlight<&'static str, usize>> = Arc::new(SingleFlight::new());

        let inner = Arc::clone(&group);
        let flight = group
            .run("outer", move || {
                // Synchronous setup may touch the registry without deadlocking.
                let in_flight = inner.in_flight();
                async move { in_flight }
            })
            .await;

        assert_eq!(flight.value, 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_clears_entry() {
        let group: SingleFlight<u8, ()> = SingleFlight::new();

        let slow = group.run(1, || tokio::time::sleep(std::time::Duration::from_secs(60)));
        let result = tokio::time::timeout(std::time::Duration::from_millis(10), slow).await;

        assert!(result.is_err());
        assert_eq!(group.in_flight(), 0);
        assert_eq!(group.waiters(&1), 0);
    }
}
