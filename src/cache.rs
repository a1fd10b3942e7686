// Keyed cache for read operations: staleness windows, invalidation by
// resource family, and coalescing of concurrent identical reads into one
// shared in-flight request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// Cache key for every read the client performs. Typed variants instead of
/// joined strings so invalidation predicates cannot suffer from prefix or
/// formatting bugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Tours,
    /// Canonical query string of the search filters.
    TourSearch(String),
    Tour(i64),
    ToursByCategory(String),
    AvailableTours,
    ToursByDateRange(String, String),
    MyBookings,
    Booking(i64),
    TourComments(i64),
    TourRating(i64),
    Comment(i64),
    Categories,
    Difficulties,
    Profile,
}

/// Coarse grouping used by mutations to invalidate every read that could
/// observe their effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFamily {
    Tours,
    Bookings,
    Comments,
    Categories,
    Profile,
}

impl QueryKey {
    pub fn family(&self) -> ResourceFamily {
        match self {
            QueryKey::Tours
            | QueryKey::TourSearch(_)
            | QueryKey::Tour(_)
            | QueryKey::ToursByCategory(_)
            | QueryKey::AvailableTours
            | QueryKey::ToursByDateRange(_, _) => ResourceFamily::Tours,
            QueryKey::MyBookings | QueryKey::Booking(_) => ResourceFamily::Bookings,
            QueryKey::TourComments(_) | QueryKey::TourRating(_) | QueryKey::Comment(_) => {
                ResourceFamily::Comments
            }
            QueryKey::Categories | QueryKey::Difficulties => ResourceFamily::Categories,
            QueryKey::Profile => ResourceFamily::Profile,
        }
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicUsize,
    misses: AtomicUsize,
    coalesced: AtomicUsize,
    invalidated: AtomicUsize,
}

/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatsReport {
    pub hits: usize,
    pub misses: usize,
    pub coalesced: usize,
    pub invalidated: usize,
}

#[derive(Clone)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

type SharedFetch = Shared<BoxFuture<'static, Result<serde_json::Value, ApiError>>>;

/// Cached results are stored as `serde_json::Value` so one map can hold
/// every resource type; callers decode through their own type parameter.
///
/// The maps are `Arc`'d because each in-flight future carries its own
/// completion bookkeeping and must keep them alive past its caller.
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CacheEntry>>,
    in_flight: Arc<DashMap<QueryKey, SharedFetch>>,
    /// Bumped by every invalidation. An in-flight fetch only writes its
    /// result back when the generation it started in is still current.
    generation: Arc<AtomicU64>,
    stats: CacheStats,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            stats: CacheStats::default(),
        }
    }

    /// Returns the cached value when `stale_after` is set and the entry is
    /// still within its window; otherwise fetches, sharing a single
    /// in-flight request among all concurrent callers of the same key.
    ///
    /// `stale_after: None` means "always revalidate": the cache is still
    /// written (mutations inspect it) and concurrency is still coalesced,
    /// but a settled entry never short-circuits the fetch. A failed fetch
    /// writes nothing, and a fetch that was still in flight when an
    /// invalidation ran writes nothing either.
    ///
    /// Callers may drop the returned future at any point; whichever
    /// awaiter drives the shared request to completion performs the
    /// cleanup, so an abandoned read never strands the key.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_after: Option<Duration>,
        fetch: F,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if let Some(window) = stale_after {
            if let Some(entry) = self.entries.get(&key) {
                if entry.stored_at.elapsed() < window {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return decode(entry.value.clone());
                }
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                let fut = fetch();
                let entries = Arc::clone(&self.entries);
                let in_flight = Arc::clone(&self.in_flight);
                let generation = Arc::clone(&self.generation);
                let started_in = generation.load(Ordering::SeqCst);
                let shared = async move {
                    let result = fut.await.and_then(|value| {
                        serde_json::to_value(value).map_err(|err| ApiError::Decode(err.to_string()))
                    });
                    // Bookkeeping lives inside the shared future: it runs
                    // once, driven by whichever awaiter reaches completion,
                    // even when the caller that started the request dropped
                    // its read mid-flight. Only this future ever removes
                    // the slot it occupies.
                    in_flight.remove(&key);
                    if let Ok(value) = &result {
                        // An invalidation issued while the request was in
                        // flight outranks the fetched value.
                        if generation.load(Ordering::SeqCst) == started_in {
                            entries.insert(
                                key,
                                CacheEntry {
                                    value: value.clone(),
                                    stored_at: Instant::now(),
                                },
                            );
                        }
                    }
                    result
                }
                .boxed()
                .shared();
                vacant.insert(shared.clone());
                shared
            }
        };

        decode(shared.await?)
    }

    /// Write-through: stores a value directly, e.g. the user returned by a
    /// profile update.
    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(value).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Cached value regardless of staleness; used by tests and callers
    /// that want to inspect state without fetching.
    pub fn get_cached<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry the predicate selects; the next read of those
    /// keys goes back to the network. Also outranks every fetch currently
    /// in flight, whose result will not be written back. Returns how many
    /// entries were dropped.
    pub fn invalidate_matching(&self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        let removed = before - self.entries.len();
        self.stats.invalidated.fetch_add(removed, Ordering::Relaxed);
        if removed > 0 {
            tracing::debug!("Invalidated {} cache entries", removed);
        }
        removed
    }

    pub fn invalidate_family(&self, family: ResourceFamily) -> usize {
        self.invalidate_matching(|key| key.family() == family)
    }

    /// Empties the whole cache, e.g. on logout.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.invalidated.fetch_add(removed, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            coalesced: self.stats.coalesced.load(Ordering::Relaxed),
            invalidated: self.stats.invalidated.load(Ordering::Relaxed),
        }
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}
