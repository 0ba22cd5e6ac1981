//! Segment routing with caching and provider fallback.
//!
//! For each consecutive waypoint pair:
//!
//! 1. endpoints closer than the pre-filter radius get a direct segment;
//! 2. a cached route (or cached "unroutable" marker) is reused;
//! 3. the selector's provider chain is tried in order, retrying transient
//!    failures with linear backoff;
//! 4. when the whole chain fails, a degraded straight-line segment is
//!    synthesised.
//!
//! Pairs are routed concurrently and returned in waypoint order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{Coord, Provider, RouteSegment, TransportMode};

use super::cache::{CacheEntry, RoutingCache};
use super::provider::{ProviderError, RouteProvider, RouteQuery, RouteResponse};
use super::selector::ProviderSelector;

/// Router tuning.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Endpoints closer than this (metres) are not routed.
    pub prefilter_m: f64,

    /// Maximum provider calls in flight per router.
    pub max_concurrent: usize,

    /// Deadline for a single provider call.
    pub call_timeout: Duration,

    /// Attempts per provider before moving down the chain.
    pub attempts_per_provider: u32,

    /// Backoff unit; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,

    /// Straight-line speeds in km/h.
    pub walking_kmh: f64,
    pub driving_kmh: f64,
    pub transit_kmh: f64,
}

impl RouterConfig {
    pub fn speed_kmh(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_kmh,
            TransportMode::Driving => self.driving_kmh,
            TransportMode::Transit => self.transit_kmh,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts_per_provider = attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefilter_m: 10.0,
            max_concurrent: 8,
            call_timeout: Duration::from_secs(10),
            attempts_per_provider: 2,
            retry_backoff: Duration::from_millis(500),
            walking_kmh: 4.5,
            driving_kmh: 30.0,
            transit_kmh: 20.0,
        }
    }
}

/// A stop to route through, labelled with its pool index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub index: usize,
    pub location: Coord,
}

impl Waypoint {
    pub fn new(index: usize, location: Coord) -> Self {
        Self { index, location }
    }
}

/// Routes waypoint pairs through a regional and a general provider.
pub struct SegmentRouter<R, G> {
    regional: R,
    general: G,
    selector: ProviderSelector,
    cache: Arc<RoutingCache>,
    config: RouterConfig,
    permits: Arc<Semaphore>,
}

impl<R: RouteProvider, G: RouteProvider> SegmentRouter<R, G> {
    pub fn new(
        regional: R,
        general: G,
        selector: ProviderSelector,
        cache: Arc<RoutingCache>,
        config: RouterConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            regional,
            general,
            selector,
            cache,
            config,
            permits,
        }
    }

    pub fn cache(&self) -> &RoutingCache {
        &self.cache
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// Straight-line estimate used when routing is impossible.
    pub fn straight_line(&self, from: Waypoint, to: Waypoint, mode: TransportMode) -> RouteSegment {
        RouteSegment::straight_line(
            from.index,
            to.index,
            from.location,
            to.location,
            mode,
            self.config.speed_kmh(mode),
        )
    }

    /// Route every consecutive pair, concurrently, in waypoint order.
    pub async fn route_waypoints(&self, waypoints: &[Waypoint], mode: TransportMode) -> Vec<RouteSegment> {
        let pairs = waypoints
            .windows(2)
            .map(|w| self.route_pair(w[0], w[1], mode));
        let segments = join_all(pairs).await;

        let degraded = segments.iter().filter(|s| s.degraded).count();
        debug!(
            pairs = segments.len(),
            degraded,
            mode = %mode,
            "routed waypoints"
        );
        segments
    }

    /// Route one pair. Never fails; falls back to a degraded segment.
    pub async fn route_pair(&self, from: Waypoint, to: Waypoint, mode: TransportMode) -> RouteSegment {
        let distance = from.location.distance_m(&to.location);
        if distance < self.config.prefilter_m {
            debug!(from = from.index, to = to.index, distance, "endpoints coincide, skipping routing");
            return RouteSegment::direct(from.index, to.index, from.location, mode);
        }

        let key = self.cache.key(from.location, to.location, mode);
        match self.cache.get(&key) {
            Some(CacheEntry::Route(segment)) => {
                debug!(from = from.index, to = to.index, "routing cache hit");
                return segment.reindexed(from.index, to.index);
            }
            Some(CacheEntry::Unroutable) => {
                debug!(from = from.index, to = to.index, "cached as unroutable");
                return self.straight_line(from, to, mode);
            }
            None => {}
        }

        let selection = self.selector.select(from.location, to.location, mode);
        debug!(
            from = from.index,
            to = to.index,
            primary = ?selection.primary,
            reason = %selection.reason,
            "selected provider"
        );

        let query = RouteQuery {
            origin: from.location,
            destination: to.location,
            mode,
        };

        let mut every_answer_was_no_route = true;
        for provider in selection.chain() {
            match self.call_with_retry(provider, &query, from.index, to.index).await {
                Ok(segment) => {
                    self.cache.store(key, CacheEntry::Route(segment.clone()));
                    return segment;
                }
                Err(e) => {
                    every_answer_was_no_route &= e.is_no_route();
                    warn!(
                        from = from.index,
                        to = to.index,
                        provider = ?provider,
                        error = %e,
                        "provider failed, falling back"
                    );
                }
            }
        }

        if every_answer_was_no_route {
            self.cache.store(key, CacheEntry::Unroutable);
        }
        warn!(from = from.index, to = to.index, "all providers failed, using straight line");
        self.straight_line(from, to, mode)
    }

    async fn call_with_retry(
        &self,
        provider: Provider,
        query: &RouteQuery,
        from_index: usize,
        to_index: usize,
    ) -> Result<RouteSegment, ProviderError> {
        let attempts = self.config.attempts_per_provider.max(1);
        let mut attempt = 1;
        loop {
            let result = self
                .call_once(provider, query)
                .await
                .and_then(|r| r.into_segment(from_index, to_index, provider, query.mode));

            match result {
                Err(e) if e.is_transient() && attempt < attempts => {
                    debug!(provider = ?provider, attempt, error = %e, "retrying provider");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn call_once(
        &self,
        provider: Provider,
        query: &RouteQuery,
    ) -> Result<RouteResponse, ProviderError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ProviderError::NotConfigured("router is shut down".to_string()))?;

        let call = async {
            match provider {
                Provider::Regional => self.regional.route(query).await,
                Provider::General => self.general.route(query).await,
                Provider::Direct | Provider::StraightLine => Err(ProviderError::NotConfigured(
                    format!("{provider:?} is not a routing backend"),
                )),
            }
        };

        tokio::time::timeout(self.config.call_timeout, call)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::geo::offset_m;
    use crate::routing::CacheConfig;
    use crate::routing::provider::RouteStatus;
    use crate::test_support::{Behaviour, StubProvider};

    fn seoul() -> Coord {
        Coord::new(37.5665, 126.9780).unwrap()
    }

    fn waypoints(n: usize, spacing_m: f64) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint::new(i, offset_m(seoul(), i as f64 * spacing_m, 0.0)))
            .collect()
    }

    fn fast_config() -> RouterConfig {
        RouterConfig::default().with_retries(2, Duration::from_millis(1))
    }

    fn router(
        regional: Arc<StubProvider>,
        general: Arc<StubProvider>,
    ) -> SegmentRouter<Arc<StubProvider>, Arc<StubProvider>> {
        SegmentRouter::new(
            regional,
            general,
            ProviderSelector::default(),
            Arc::new(RoutingCache::default()),
            fast_config(),
        )
    }

    #[tokio::test]
    async fn walking_in_korea_uses_regional() {
        let regional = Arc::new(StubProvider::ok());
        let general = Arc::new(StubProvider::ok());
        let router = router(regional.clone(), general.clone());

        let segments = router.route_waypoints(&waypoints(4, 400.0), TransportMode::Walking).await;

        assert_eq!(segments.len(), 3);
        for (i, s) in segments.iter().enumerate() {
            assert_eq!((s.from_index, s.to_index), (i, i + 1));
            assert_eq!(s.provider, Provider::Regional);
            assert!(!s.degraded);
        }
        assert_eq!(regional.calls(), 3);
        assert_eq!(general.calls(), 0);
    }

    #[tokio::test]
    async fn cached_pair_skips_provider() {
        let regional = Arc::new(StubProvider::ok());
        let router = router(regional.clone(), Arc::new(StubProvider::ok()));
        let wps = waypoints(2, 300.0);

        let first = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;
        let relabelled = router
            .route_pair(Waypoint::new(7, wps[0].location), Waypoint::new(9, wps[1].location), TransportMode::Walking)
            .await;

        assert_eq!(regional.calls(), 1);
        assert_eq!(relabelled.distance_m, first.distance_m);
        assert_eq!((relabelled.from_index, relabelled.to_index), (7, 9));
    }

    #[tokio::test]
    async fn prefilter_skips_cache_and_providers() {
        let regional = Arc::new(StubProvider::ok());
        let general = Arc::new(StubProvider::ok());
        let router = router(regional.clone(), general.clone());
        let a = Waypoint::new(0, seoul());
        let b = Waypoint::new(1, offset_m(seoul(), 5.0, 0.0));

        let seg = router.route_pair(a, b, TransportMode::Walking).await;

        assert_eq!(seg.provider, Provider::Direct);
        assert_eq!(seg.distance_m, 0.0);
        assert_eq!(regional.calls() + general.calls(), 0);
        assert_eq!(router.cache().stats().misses, 0);
    }

    #[tokio::test]
    async fn regional_failure_falls_back_to_general() {
        let regional = Arc::new(StubProvider::new(Behaviour::Status(RouteStatus::RequestDenied)));
        let general = Arc::new(StubProvider::ok());
        let router = router(regional.clone(), general.clone());
        let wps = waypoints(2, 500.0);

        let seg = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;

        assert_eq!(seg.provider, Provider::General);
        assert!(!seg.degraded);
        // Denied is not transient, so no retry.
        assert_eq!(regional.calls(), 1);
        assert_eq!(general.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let regional = Arc::new(StubProvider::new(Behaviour::FailTimes(1)));
        let router = router(regional.clone(), Arc::new(StubProvider::ok()));
        let wps = waypoints(2, 500.0);

        let seg = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;

        assert_eq!(seg.provider, Provider::Regional);
        assert_eq!(regional.calls(), 2);
    }

    #[tokio::test]
    async fn total_failure_degrades_and_is_not_cached() {
        let regional = Arc::new(StubProvider::new(Behaviour::Unavailable));
        let general = Arc::new(StubProvider::new(Behaviour::Unavailable));
        let router = router(regional.clone(), general.clone());
        let wps = waypoints(2, 800.0);

        let seg = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;

        assert!(seg.degraded);
        assert_eq!(seg.provider, Provider::StraightLine);
        assert!(router.cache().is_empty());
        assert_eq!(regional.calls(), 2);
        assert_eq!(general.calls(), 2);
    }

    #[tokio::test]
    async fn definitive_no_route_is_remembered() {
        let regional = Arc::new(StubProvider::new(Behaviour::Status(RouteStatus::ZeroResults)));
        let general = Arc::new(StubProvider::new(Behaviour::Status(RouteStatus::ZeroResults)));
        let router = router(regional.clone(), general.clone());
        let wps = waypoints(2, 800.0);

        let first = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;
        let second = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;

        assert!(first.degraded && second.degraded);
        assert_eq!(regional.calls(), 1);
        assert_eq!(general.calls(), 1);
    }

    #[tokio::test]
    async fn slow_provider_times_out_into_fallback() {
        let regional = Arc::new(StubProvider::new(Behaviour::Hang));
        let general = Arc::new(StubProvider::ok());
        let router = SegmentRouter::new(
            regional.clone(),
            general.clone(),
            ProviderSelector::default(),
            Arc::new(RoutingCache::new(&CacheConfig::default())),
            RouterConfig::default()
                .with_call_timeout(Duration::from_millis(20))
                .with_retries(1, Duration::from_millis(1)),
        );
        let wps = waypoints(2, 500.0);

        let seg = router.route_pair(wps[0], wps[1], TransportMode::Walking).await;

        assert_eq!(seg.provider, Provider::General);
    }

    #[tokio::test]
    async fn one_failing_pair_degrades_only_that_pair() {
        let wps = waypoints(4, 600.0);
        let bad = (wps[1].location, wps[2].location);
        let regional = Arc::new(StubProvider::ok().failing_between(bad.0, bad.1));
        let general = Arc::new(StubProvider::ok().failing_between(bad.0, bad.1));
        let router = router(regional, general);

        let segments = router.route_waypoints(&wps, TransportMode::Walking).await;

        assert_eq!(segments.len(), 3);
        assert!(!segments[0].degraded);
        assert!(segments[1].degraded);
        assert!(!segments[2].degraded);
        assert_eq!((segments[1].from_index, segments[1].to_index), (1, 2));
    }

    #[tokio::test]
    async fn transit_goes_straight_to_general() {
        let regional = Arc::new(StubProvider::ok());
        let general = Arc::new(StubProvider::new(Behaviour::Status(RouteStatus::ZeroResults)));
        let router = router(regional.clone(), general.clone());
        let wps = waypoints(2, 2_000.0);

        let seg = router.route_pair(wps[0], wps[1], TransportMode::Transit).await;

        assert!(seg.degraded);
        assert_eq!(regional.calls(), 0);
        assert_eq!(general.calls(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prefilter_threshold(short in 0.0f64..9.0, long in 11.0f64..5_000.0) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let regional = Arc::new(StubProvider::ok());
                    let general = Arc::new(StubProvider::ok());
                    let router = router(regional.clone(), general.clone());
                    let a = Waypoint::new(0, seoul());

                    let near = Waypoint::new(1, offset_m(seoul(), short, 0.0));
                    router.route_pair(a, near, TransportMode::Walking).await;
                    assert_eq!(regional.calls() + general.calls(), 0);

                    let far = Waypoint::new(1, offset_m(seoul(), long, 0.0));
                    router.route_pair(a, far, TransportMode::Walking).await;
                    assert_eq!(regional.calls() + general.calls(), 1);
                });
            }
        }
    }
}
