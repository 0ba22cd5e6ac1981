//! Bounded FIFO memo of computed segments.
//!
//! Keys round both endpoints to a fixed number of decimal places, so GPS
//! noise below that precision still hits. Entries are never invalidated;
//! once the cache is full the oldest insertion is evicted. The map and the
//! insertion queue live under one mutex so eviction and insertion are a
//! single atomic step.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::{Coord, RouteSegment, TransportMode};

/// Configuration for the routing cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before FIFO eviction.
    pub capacity: usize,

    /// Decimal places kept when rounding coordinates into keys.
    pub precision: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            precision: 5,
        }
    }
}

/// Rounded (origin, destination, mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    origin: (i64, i64),
    destination: (i64, i64),
    mode: TransportMode,
}

impl CacheKey {
    pub fn new(origin: Coord, destination: Coord, mode: TransportMode, precision: u32) -> Self {
        Self {
            origin: origin.fixed_point(precision),
            destination: destination.fixed_point(precision),
            mode,
        }
    }
}

/// A memoised outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Route(RouteSegment),
    /// Every provider reported that no route exists.
    Unroutable,
}

/// Counters for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    order: VecDeque<CacheKey>,
}

/// Shared segment cache.
pub struct RoutingCache {
    inner: Mutex<Inner>,
    capacity: usize,
    precision: u32,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl RoutingCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: config.capacity,
            precision: config.precision,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    // Nothing panics while holding the lock, and every update leaves the
    // map and queue consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn key(&self, origin: Coord, destination: Coord, mode: TransportMode) -> CacheKey {
        CacheKey::new(origin, destination, mode, self.precision)
    }

    pub fn lookup(&self, origin: Coord, destination: Coord, mode: TransportMode) -> Option<CacheEntry> {
        self.get(&self.key(origin, destination, mode))
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let found = self.lock().entries.get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert or replace an entry, returning the key evicted to make room.
    ///
    /// Replacing an existing key keeps its original queue position.
    pub fn store(&self, key: CacheKey, entry: CacheEntry) -> Option<CacheKey> {
        if self.capacity == 0 {
            return None;
        }

        let mut inner = self.lock();
        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = entry;
            return None;
        }

        let evicted = if inner.entries.len() >= self.capacity {
            let oldest = inner.order.pop_front();
            if let Some(oldest) = &oldest {
                inner.entries.remove(oldest);
            }
            oldest
        } else {
            None
        };

        inner.order.push_back(key);
        inner.entries.insert(key, entry);
        drop(inner);

        if let Some(k) = &evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(evicted = ?k, "routing cache full, evicted oldest entry");
        }
        evicted
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}

impl Default for RoutingCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
