//! Single-flight request coalescing
//!
//! Concurrent callers asking for the same key share one underlying future.
//! The first caller creates it; everyone else awaits a clone of the same
//! [`Shared`] handle. The shared future removes its own key when it
//! completes, so the map only ever holds operations that are still running.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type InflightMap<K, V> = Arc<Mutex<HashMap<K, Shared<BoxFuture<'static, V>>>>>;

pub struct SingleFlight<K, V>
where
    V: Clone,
{
    inflight: InflightMap<K, V>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `make()` for `key` unless an identical request is already in flight
    ///
    /// `make` is only invoked when this call becomes the leader. The returned
    /// value is the same for every caller that joined the flight.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let shared = {
            let mut map = self.inflight.lock();
            match map.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let inflight = Arc::clone(&self.inflight);
                    let cleanup_key = key.clone();
                    let operation = make();
                    let shared = async move {
                        let value = operation.await;
                        inflight.lock().remove(&cleanup_key);
                        value
                    }
                    .boxed()
                    .shared();
                    map.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// True while an operation for `key` is running
    pub fn contains(&self, key: &K) -> bool {
        self.inflight.lock().contains_key(key)
    }

    /// Number of operations currently in flight
    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_call() {
        let flight: SingleFlight<String, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                42
            }
        };

        let results = futures::future::join_all((0..5).map(|_| {
            flight.run("page:3".to_string(), make(Arc::clone(&calls)))
        }))
        .await;

        assert_eq!(results, vec![42; 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(flight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_independently() {
        let flight: SingleFlight<u32, u32> = SingleFlight::new();
        let (a, b) = tokio::join!(
            flight.run(1, || async { 10 }),
            flight.run(2, || async { 20 })
        );
        assert_eq!((a, b), (10, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_released_after_completion() {
        let flight: SingleFlight<u32, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let counter = Arc::clone(&calls);
            flight
                .run(7, move || async move { counter.fetch_add(1, Ordering::SeqCst) as u32 })
                .await;
            assert_eq!(calls.load(Ordering::SeqCst), expected);
            assert!(!flight.contains(&7));
        }
    }
}
