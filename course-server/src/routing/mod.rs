//! Route computation between course stops.
//!
//! [`ProviderSelector`] picks a provider chain per segment,
//! [`RoutingCache`] memoises answers, and [`SegmentRouter`] ties them
//! together with retries, fallback and straight-line degradation.

mod cache;
mod http;
mod provider;
mod router;
mod selector;

pub use cache::{CacheConfig, CacheEntry, CacheKey, CacheStats, RoutingCache};
pub use http::{HttpRouteProvider, RouteBackend};
pub use provider::{
    ProviderError, RouteBody, RouteLeg, RouteProvider, RouteQuery, RouteResponse, RouteStatus,
};
pub use router::{RouterConfig, SegmentRouter, Waypoint};
pub use selector::{ProviderSelector, Selection, SelectionReason, SupportedRegion};
