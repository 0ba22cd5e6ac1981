//! Search, score, focus, assemble.

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::candidates::{CandidateScorer, ScoredPool};
use crate::cluster::{ClusterConfig, ClusterEngine};
use crate::course::{AssemblyError, AssemblyRequest, CourseAssembler, CourseProposer};
use crate::domain::{CandidatePlace, RawHit};
use crate::routing::RouteProvider;
use crate::search::{PlaceSearch, SearchError, build_queries};

use super::output::CourseOutput;
use super::request::{PlanRequest, ValidRequest};
use super::PipelineError;

/// The end-to-end course pipeline.
pub struct Pipeline<S, P, R, G> {
    search: S,
    scorer: CandidateScorer,
    cluster: ClusterConfig,
    assembler: CourseAssembler<P, R, G>,
}

impl<S, P, R, G> Pipeline<S, P, R, G>
where
    S: PlaceSearch,
    P: CourseProposer,
    R: RouteProvider,
    G: RouteProvider,
{
    pub fn new(
        search: S,
        scorer: CandidateScorer,
        cluster: ClusterConfig,
        assembler: CourseAssembler<P, R, G>,
    ) -> Self {
        Self {
            search,
            scorer,
            cluster,
            assembler,
        }
    }

    pub fn assembler(&self) -> &CourseAssembler<P, R, G> {
        &self.assembler
    }

    pub async fn run(&self, request: PlanRequest) -> Result<CourseOutput, PipelineError> {
        let request = request.validate(self.assembler.config().default_stop_count)?;
        info!(
            theme = %request.theme,
            location = %request.location,
            mode = %request.mode,
            stops = request.stop_count,
            pinned = request.saved_places.len(),
            "planning course"
        );

        let hits = self.discover(&request).await?;
        let pool = match self.scorer.score(&hits, &request.saved_places) {
            ScoredPool::Ready(pool) => pool,
            ScoredPool::Insufficient {
                candidates,
                required,
            } => {
                return Err(AssemblyError::InsufficientCandidates {
                    found: candidates.len(),
                    required,
                }
                .into());
            }
        };
        let pool = self.focus(pool, &request);

        let assembled = self
            .assembler
            .assemble(
                &pool,
                &AssemblyRequest {
                    theme: request.theme.clone(),
                    stop_count: request.stop_count,
                    mode: request.mode,
                    budget: request.budget,
                    group_size: request.group_size,
                },
            )
            .await?;

        Ok(CourseOutput::new(&pool, assembled))
    }

    /// Run every query concurrently and pool the hits.
    ///
    /// Failed queries are skipped. Only when all of them fail and there
    /// are no saved places to build on is the search error returned.
    async fn discover(&self, request: &ValidRequest) -> Result<Vec<RawHit>, PipelineError> {
        let queries = build_queries(&request.theme, &request.location);
        let results = join_all(queries.iter().map(|q| self.search.search(q))).await;

        let mut hits = Vec::new();
        let mut first_error: Option<SearchError> = None;
        let mut failed = 0;
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(found) => {
                    debug!(query = %query, hits = found.len(), "search answered");
                    // The query that produced a hit is the corroboration signal.
                    hits.extend(found.into_iter().map(|h| h.with_query(query.as_str())));
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if failed == queries.len() && request.saved_places.is_empty() {
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }
        Ok(hits)
    }

    /// Narrow a large pool to its most attractive walkable cluster.
    fn focus(&self, pool: Vec<CandidatePlace>, request: &ValidRequest) -> Vec<CandidatePlace> {
        if pool.len() <= self.cluster.activation_threshold {
            return pool;
        }
        let engine = ClusterEngine::for_mode(&self.cluster, request.mode);
        let min_size = request
            .stop_count
            .max(self.assembler.config().min_candidates);
        engine.focus(&pool, min_size)
    }
}
