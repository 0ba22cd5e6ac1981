//! Application state for the web layer.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::candidates::{CandidateScorer, ScoringConfig};
use crate::cluster::ClusterConfig;
use crate::config::{AppConfig, ConfigError, SearchSource};
use crate::course::{AssemblyConfig, CourseAssembler, GreedyProposer, HttpCourseProposer, ProposerBackend};
use crate::pipeline::{Pipeline, TaskRegistry};
use crate::routing::{
    CacheConfig, ProviderSelector, RouteBackend, RouterConfig, RoutingCache, SegmentRouter,
};
use crate::search::{
    CachedGeocoder, FixtureSearch, GeocodeCacheConfig, GeocoderBackend, GeocodingSearch,
    HttpGeocoder, HttpPlaceSearch, SearchBackend,
};

/// The pipeline as wired from configuration.
pub type LivePipeline = Pipeline<
    GeocodingSearch<SearchBackend, CachedGeocoder<GeocoderBackend>>,
    ProposerBackend,
    RouteBackend,
    RouteBackend,
>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LivePipeline>,
    pub tasks: TaskRegistry,
}

impl AppState {
    pub fn new(pipeline: LivePipeline, tasks: TaskRegistry) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            tasks,
        }
    }

    /// Build every backend named in `config`, with default tuning apart from
    /// the configured timeouts.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let search = match &config.search {
            SearchSource::Http(endpoint) => SearchBackend::Http(HttpPlaceSearch::new(endpoint.clone())?),
            SearchSource::Fixture(path) => {
                let fixture = FixtureSearch::load(path)?;
                info!(path = %path.display(), hits = fixture.len(), "loaded search fixture");
                SearchBackend::Fixture(fixture)
            }
        };
        let geocoder = match &config.geocoder {
            Some(endpoint) => GeocoderBackend::Http(HttpGeocoder::new(endpoint.clone())?),
            None => GeocoderBackend::Disabled,
        };
        let proposer = match &config.proposer {
            Some(endpoint) => ProposerBackend::Http(HttpCourseProposer::new(endpoint.clone())?),
            None => {
                info!("no proposer configured, using greedy plans");
                ProposerBackend::Greedy(GreedyProposer)
            }
        };

        let regional = RouteBackend::from_config("regional", config.regional_route.clone())?;
        let general = RouteBackend::from_config("general", config.general_route.clone())?;
        info!(
            regional = regional.is_configured(),
            general = general.is_configured(),
            "routing providers"
        );

        let router = SegmentRouter::new(
            regional,
            general,
            ProviderSelector::default(),
            Arc::new(RoutingCache::new(&CacheConfig::default())),
            RouterConfig::default()
                .with_call_timeout(Duration::from_secs(config.outbound_timeout_secs)),
        );
        let assembly = AssemblyConfig::default()
            .with_proposal_timeout(Duration::from_secs(config.proposer_timeout_secs));
        let pipeline = Pipeline::new(
            GeocodingSearch::new(
                search,
                CachedGeocoder::new(geocoder, &GeocodeCacheConfig::default()),
            ),
            CandidateScorer::new(ScoringConfig::default()),
            ClusterConfig::default(),
            CourseAssembler::new(proposer, Arc::new(router), assembly),
        );

        Ok(Self::new(pipeline, TaskRegistry::new(config.task_ttl)))
    }
}
