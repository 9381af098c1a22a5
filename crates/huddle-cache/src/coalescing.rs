//! TTL cache that coalesces concurrent fetches per key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::{debug, trace};

use huddle_core::error::AppError;
use huddle_core::result::AppResult;

/// A cached value with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Shared handle to a fetch that is currently in flight for one key.
type InFlight<V> = Shared<BoxFuture<'static, Result<V, Arc<AppError>>>>;

/// Generic TTL cache with per-key coalescing of concurrent fetches.
///
/// Concurrent [`get_or_fetch`](Self::get_or_fetch) calls for the same
/// key share a single underlying fetch. Negative results (e.g. `false`)
/// are cached like any other value. Expired entries are kept until
/// overwritten or invalidated so a failed refresh can fall back to the
/// last known value.
pub struct CoalescingCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for CoalescingCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    pending: DashMap<K, InFlight<V>>,
    ttl: Duration,
}

impl<K, V> CoalescingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                pending: DashMap::new(),
                ttl,
            }),
        }
    }

    /// Value for `key`, running `fetcher` at most once across concurrent
    /// callers.
    ///
    /// A fresh entry is returned without fetching. If a fetch for the key
    /// is already in flight, the call joins it instead of starting a
    /// duplicate. On fetch failure the stale cached value is served when
    /// one exists; the error is returned only when the key was never
    /// cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetcher: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        if let Some(entry) = self.inner.entries.get(&key) {
            if entry.is_fresh(self.inner.ttl) {
                return Ok(entry.value.clone());
            }
        }

        let flight = self.join_or_start(key.clone(), fetcher);
        match flight.await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(entry) = self.inner.entries.get(&key) {
                    trace!("fetch failed, serving stale entry");
                    return Ok(entry.value.clone());
                }
                Err((*err).clone())
            }
        }
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), but never fails: a
    /// fetch error falls back to the stale cached value, or `default`
    /// when the key was never cached.
    pub async fn get_or_default<F, Fut>(&self, key: K, fetcher: F, default: V) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        match self.get_or_fetch(key, fetcher).await {
            Ok(value) => value,
            Err(err) => {
                debug!(%err, "fetch failed with no cached value, using default");
                default
            }
        }
    }

    /// Bulk lookup: returns cached values and issues exactly one bulk
    /// call for the keys that need fetching.
    ///
    /// Each fetched value is merged back individually under its own TTL
    /// clock. On bulk failure the stale entries that exist are returned
    /// and the rest are omitted; the error never reaches the caller.
    pub async fn get_or_fetch_many<F, Fut>(&self, keys: &[K], bulk_fetcher: F) -> HashMap<K, V>
    where
        F: FnOnce(Vec<K>) -> Fut,
        Fut: Future<Output = AppResult<HashMap<K, V>>>,
    {
        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        for key in keys {
            match self.inner.entries.get(key) {
                Some(entry) if entry.is_fresh(self.inner.ttl) => {
                    resolved.insert(key.clone(), entry.value.clone());
                }
                _ => missing.push(key.clone()),
            }
        }
        if missing.is_empty() {
            return resolved;
        }

        match bulk_fetcher(missing.clone()).await {
            Ok(fetched) => {
                for (key, value) in fetched {
                    self.inner.entries.insert(
                        key.clone(),
                        CacheEntry {
                            value: value.clone(),
                            inserted_at: Instant::now(),
                        },
                    );
                    resolved.insert(key, value);
                }
            }
            Err(err) => {
                debug!(%err, "bulk fetch failed, serving stale entries");
                for key in missing {
                    if let Some(entry) = self.inner.entries.get(&key) {
                        resolved.insert(key.clone(), entry.value.clone());
                    }
                }
            }
        }
        resolved
    }

    /// Insert a value directly, resetting its TTL clock.
    pub fn insert(&self, key: K, value: V) {
        self.inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop one key.
    pub fn invalidate(&self, key: &K) {
        self.inner.entries.remove(key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Number of cached entries (fresh and stale).
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Join the in-flight fetch for `key`, or start one.
    ///
    /// The bookkeeping inside the shared future runs exactly once, on
    /// whichever caller first polls it to completion: the value is cached
    /// and the in-flight marker is removed on completion, success or
    /// failure, so a later caller starts a fresh fetch. The future holds
    /// only a weak reference to the cache; the pending map storing the
    /// future would otherwise keep the cache alive through itself once
    /// every caller has dropped.
    fn join_or_start<F, Fut>(&self, key: K, fetcher: F) -> InFlight<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>> + Send + 'static,
    {
        match self.inner.pending.entry(key.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let weak: Weak<Inner<K, V>> = Arc::downgrade(&self.inner);
                let fut = fetcher();
                let flight: InFlight<V> = async move {
                    let result = fut.await;
                    if let Some(inner) = weak.upgrade() {
                        if let Ok(value) = &result {
                            inner.entries.insert(
                                key.clone(),
                                CacheEntry {
                                    value: value.clone(),
                                    inserted_at: Instant::now(),
                                },
                            );
                        }
                        inner.pending.remove(&key);
                    }
                    result.map_err(Arc::new)
                }
                .boxed()
                .shared();
                slot.insert(flight.clone());
                flight
            }
        }
    }
}
