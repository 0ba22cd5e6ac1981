//! Geocoding of hits that arrive without coordinates.
//!
//! Place names repeat across queries and requests, so lookups go through
//! a TTL cache. Misses (no coordinates found) are cached too.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::candidates::short_title;
use crate::domain::{Coord, RawHit};

use super::{PlaceSearch, SearchError};

/// An address-to-coordinate lookup.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> impl Future<Output = Result<Option<Coord>, SearchError>> + Send;
}

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Geocoder with caching.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: MokaCache<String, Option<Coord>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, config: &GeocodeCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self { inner, cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Option<Coord>, SearchError> {
        let key = address.trim().to_string();
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }
        // Errors are not cached, so a flaky geocoder is retried next time.
        let found = self.inner.geocode(&key).await?;
        self.cache.insert(key, found).await;
        Ok(found)
    }
}

/// Search decorator that fills in missing coordinates.
pub struct GeocodingSearch<S, G> {
    search: S,
    geocoder: G,
}

impl<S: PlaceSearch, G: Geocoder> GeocodingSearch<S, G> {
    pub fn new(search: S, geocoder: G) -> Self {
        Self { search, geocoder }
    }

    async fn locate(&self, mut hit: RawHit) -> RawHit {
        if hit.coordinates.is_some() {
            return hit;
        }
        let address = hit
            .address
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| short_title(&hit.name));
        match self.geocoder.geocode(&address).await {
            Ok(found) => hit.coordinates = found,
            Err(e) => warn!(name = %hit.name, error = %e, "geocoding failed"),
        }
        hit
    }
}

impl<S: PlaceSearch, G: Geocoder> PlaceSearch for GeocodingSearch<S, G> {
    async fn search(&self, query: &str) -> Result<Vec<RawHit>, SearchError> {
        let hits = self.search.search(query).await?;
        let missing = hits.iter().filter(|h| h.coordinates.is_none()).count();
        if missing == 0 {
            return Ok(hits);
        }

        let located = join_all(hits.into_iter().map(|h| self.locate(h))).await;
        debug!(
            query,
            missing,
            resolved = missing - located.iter().filter(|h| h.coordinates.is_none()).count(),
            "geocoded hits"
        );
        Ok(located)
    }
}
