//! Memoization of count-query results.
//!
//! Keys sort their parameters by name, so argument ordering never causes
//! a miss for semantically identical queries. Population of a given key
//! is serialized through a per-key `tokio::sync::OnceCell`: two requests
//! for the same uncached key run the underlying query once, while
//! requests for different keys never block each other. The slot-map
//! mutex is held only for bookkeeping, never across store I/O. Failed
//! computations are not cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::query::QueryParameter;

/// Default cache capacity.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Cache key: query text, series date, and the parameter list sorted by
/// name with canonical JSON values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountKey {
    text: String,
    date: String,
    parameters: Vec<(String, String)>,
}

impl CountKey {
    pub fn new(text: &str, date: &str, parameters: &[QueryParameter]) -> Self {
        let mut parameters: Vec<(String, String)> = parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.to_string()))
            .collect();
        parameters.sort();

        Self {
            text: text.to_string(),
            date: date.to_string(),
            parameters,
        }
    }
}

struct Slot {
    cell: Arc<OnceCell<u64>>,
    last_used: u64,
}

/// Bounded, LRU-evicting memoization of count results.
pub struct CountCache {
    capacity: usize,
    tick: AtomicU64,
    slots: Mutex<HashMap<CountKey, Slot>>,
}

impl CountCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached count for `key`, computing it at most once per
    /// cache-population window. Errors from `compute` are returned to the
    /// caller and leave the entry unpopulated.
    pub async fn get_or_compute<F, Fut, E>(&self, key: CountKey, compute: F) -> Result<u64, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
    {
        let cell = self.slot(key);
        cell.get_or_try_init(compute).await.copied()
    }

    /// Fetch or create the key's slot, bump its recency, and evict the
    /// least-recently-used entry on overflow. An evicted in-flight
    /// population completes against its own handle and is discarded.
    fn slot(&self, key: CountKey) -> Arc<OnceCell<u64>> {
        let mut slots = self.lock_slots();
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);

        let slot = slots.entry(key).or_insert_with(|| Slot {
            cell: Arc::new(OnceCell::new()),
            last_used: 0,
        });
        slot.last_used = tick;
        let cell = Arc::clone(&slot.cell);

        if slots.len() > self.capacity {
            let oldest = slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                slots.remove(&oldest);
            }
        }

        cell
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<CountKey, Slot>> {
        // A panic while holding the lock leaves only bookkeeping state;
        // recover the map rather than propagate the poison.
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn param(name: &str, value: &str) -> QueryParameter {
        QueryParameter::new(name, json!(value))
    }

    #[test]
    fn test_key_is_order_independent() {
        let forward = [param("@a", "1"), param("@b", "2"), param("@c", "3")];
        let shuffled = [param("@c", "3"), param("@a", "1"), param("@b", "2")];

        let k1 = CountKey::new("SELECT VALUE COUNT(1) FROM c", "2020-11-20", &forward);
        let k2 = CountKey::new("SELECT VALUE COUNT(1) FROM c", "2020-11-20", &shuffled);
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_distinguishes_dates_and_values() {
        let params = [param("@a", "1")];
        let k1 = CountKey::new("q", "2020-11-20", &params);
        let k2 = CountKey::new("q", "2020-11-21", &params);
        let k3 = CountKey::new("q", "2020-11-20", &[param("@a", "2")]);
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let cache = CountCache::new(8);
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let count: Result<u64, ()> = cache
                .get_or_compute(CountKey::new("q", "d", &[]), || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(count, Ok(42));
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = CountCache::new(8);
        let key = CountKey::new("q", "d", &[]);

        let failed: Result<u64, &str> = cache
            .get_or_compute(key.clone(), || async { Err("store down") })
            .await;
        assert_eq!(failed, Err("store down"));

        let recovered: Result<u64, &str> = cache
            .get_or_compute(key, || async { Ok(7) })
            .await;
        assert_eq!(recovered, Ok(7));
    }

    #[tokio::test]
    async fn test_lru_eviction_on_overflow() {
        let cache = CountCache::new(2);
        let runs = AtomicUsize::new(0);

        let compute = |value: u64| {
            let runs = &runs;
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<u64, ()>(value)
            }
        };

        let key_a = CountKey::new("a", "d", &[]);
        let key_b = CountKey::new("b", "d", &[]);
        let key_c = CountKey::new("c", "d", &[]);

        let _ = cache.get_or_compute(key_a.clone(), compute(1)).await;
        let _ = cache.get_or_compute(key_b, compute(2)).await;
        // Touch `a` so `b` becomes the least recently used...
        let _ = cache.get_or_compute(key_a.clone(), compute(1)).await;
        // ...then overflow: `b` is evicted, `a` survives.
        let _ = cache.get_or_compute(key_c, compute(3)).await;

        assert_eq!(cache.len(), 2);
        let before = runs.load(Ordering::SeqCst);
        let _ = cache.get_or_compute(key_a, compute(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), before, "`a` should still be cached");
    }

    #[tokio::test]
    async fn test_default_capacity_eviction() {
        let cache = CountCache::with_default_capacity();
        let runs = AtomicUsize::new(0);

        for i in 0..(DEFAULT_CAPACITY as u64 + 1) {
            let _: Result<u64, ()> = cache
                .get_or_compute(CountKey::new(&format!("q{i}"), "d", &[]), || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(i)
                })
                .await;
        }

        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        // The first key was the least recently used; its next lookup is a
        // fresh computation.
        let before = runs.load(Ordering::SeqCst);
        let _: Result<u64, ()> = cache
            .get_or_compute(CountKey::new("q0", "d", &[]), || async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            })
            .await;
        assert_eq!(runs.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_runs_once() {
        let cache = Arc::new(CountCache::new(8));
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(CountKey::new("q", "d", &[]), || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<u64, ()>(99)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(99));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
