//! HTTP search and geocoding adapters, and the backend enums used by the
//! binary.

use serde::{Deserialize, Serialize};

use crate::client::{ClientConfig, ClientError, JsonClient};
use crate::domain::{Coord, RawHit};

use super::fixture::FixtureSearch;
use super::{Geocoder, PlaceSearch, SearchError};

/// Maximum hits requested per query.
const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Search collaborator reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlaceSearch {
    client: JsonClient,
    limit: usize,
}

impl HttpPlaceSearch {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: JsonClient::new(config)?,
            limit: DEFAULT_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

impl PlaceSearch for HttpPlaceSearch {
    async fn search(&self, query: &str) -> Result<Vec<RawHit>, SearchError> {
        let request = SearchRequest {
            query,
            limit: self.limit,
        };
        let response: SearchResponse = self.client.post("", &request).await?;
        Ok(response
            .hits
            .into_iter()
            .map(|hit| hit.with_query(query))
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct GeocodeRequest<'a> {
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    coordinates: Option<Coord>,
}

/// Geocoding collaborator reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: JsonClient,
}

impl HttpGeocoder {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: JsonClient::new(config)?,
        })
    }
}

impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coord>, SearchError> {
        let response: GeocodeResponse = self.client.post("", &GeocodeRequest { address }).await?;
        match response.status.as_str() {
            "OK" => Ok(response.coordinates.and_then(|c| c.validated().ok())),
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(None),
            other => Err(SearchError::Status(other.to_string())),
        }
    }
}

/// Search backend selected at startup.
#[derive(Debug, Clone)]
pub enum SearchBackend {
    Http(HttpPlaceSearch),
    Fixture(FixtureSearch),
}

impl PlaceSearch for SearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<RawHit>, SearchError> {
        match self {
            SearchBackend::Http(s) => s.search(query).await,
            SearchBackend::Fixture(s) => s.search(query).await,
        }
    }
}

/// Geocoder selected at startup. Disabled means hits without coordinates
/// are left as they are (and later dropped by scoring).
#[derive(Debug, Clone)]
pub enum GeocoderBackend {
    Http(HttpGeocoder),
    Disabled,
}

impl Geocoder for GeocoderBackend {
    async fn geocode(&self, address: &str) -> Result<Option<Coord>, SearchError> {
        match self {
            GeocoderBackend::Http(g) => g.geocode(address).await,
            GeocoderBackend::Disabled => Ok(None),
        }
    }
}
