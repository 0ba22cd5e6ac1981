//! Candidate discovery: search and geocoding collaborators.
//!
//! The core only needs "query string in, raw hits out". Which service
//! answers, and how many queries are issued, is decided here.

mod fixture;
mod geocode;
mod http;

use std::future::Future;

use crate::client::ClientError;
use crate::domain::RawHit;

pub use fixture::FixtureSearch;
pub use geocode::{CachedGeocoder, GeocodeCacheConfig, Geocoder, GeocodingSearch};
pub use http::{GeocoderBackend, HttpGeocoder, HttpPlaceSearch, SearchBackend};

/// Errors from search and geocoding collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Fixture file could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Fixture file or answer did not parse
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Geocoder answered with an error status
    #[error("geocoder answered {0}")]
    Status(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// A place-search backend.
pub trait PlaceSearch: Send + Sync {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<RawHit>, SearchError>> + Send;
}

impl<S: PlaceSearch> PlaceSearch for std::sync::Arc<S> {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<RawHit>, SearchError>> + Send {
        (**self).search(query)
    }
}

/// Search queries for a theme in a location: a general one plus one per
/// outing component (coffee, an activity, a meal).
///
/// ```
/// use course_server::search::build_queries;
///
/// let queries = build_queries("레트로 데이트", "성수동");
/// assert_eq!(queries[0], "성수동 레트로 데이트");
/// assert_eq!(queries.len(), 4);
/// ```
pub fn build_queries(theme: &str, location: &str) -> Vec<String> {
    let base = format!("{} {}", location.trim(), theme.trim());
    let base = base.trim().to_string();
    if base.is_empty() {
        return Vec::new();
    }

    let mut queries = vec![
        base.clone(),
        format!("{base} 카페"),
        format!("{base} 팝업스토어 전시회"),
        format!("{base} 맛집 추천"),
    ];
    queries.dedup();
    queries
}
