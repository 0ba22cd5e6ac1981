//! Stub collaborators and pool builders shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::ClientError;
use crate::course::{CourseProposer, Proposal, ProposalError, ProposalRequest};
use crate::domain::geo::offset_m;
use crate::domain::{CandidatePlace, Category, Coord, RawHit, RouteStep};
use crate::routing::{ProviderError, RouteBody, RouteLeg, RouteProvider, RouteQuery, RouteResponse, RouteStatus};
use crate::search::{PlaceSearch, SearchError};

/// Seongsu-dong, Seoul.
pub fn seongsu() -> Coord {
    Coord::new(37.5445, 127.0560).unwrap()
}

/// A candidate at an offset from [`seongsu`].
pub fn candidate(index: usize, category: Category, north_m: f64, east_m: f64) -> CandidatePlace {
    CandidatePlace {
        name: format!("{category} {index}"),
        address: None,
        coordinates: offset_m(seongsu(), north_m, east_m),
        category,
        rating: Some(4.5),
        review_count: 100,
        trust_score: 1.0 - index as f64 * 0.01,
        original_index: index,
        is_user_saved: false,
        corroborated: false,
    }
}

/// A ranked pool from `(category, north_m, east_m, pinned)` rows.
///
/// Pinned rows must come first, as the scorer guarantees.
pub fn pool(rows: &[(Category, f64, f64, bool)]) -> Vec<CandidatePlace> {
    rows.iter()
        .enumerate()
        .map(|(i, &(category, north, east, pinned))| CandidatePlace {
            is_user_saved: pinned,
            ..candidate(i, category, north, east)
        })
        .collect()
}

/// How a [`StubProvider`] answers.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    /// Walking-speed route along the straight line.
    Ok,
    /// A fixed non-OK status.
    Status(RouteStatus),
    /// A transient error for the first `n` calls, then `Ok`.
    FailTimes(usize),
    /// A transient error on every call.
    Unavailable,
    /// Never answers.
    Hang,
}

pub struct StubProvider {
    behaviour: Behaviour,
    failing: Vec<(Coord, Coord)>,
    calls: Mutex<usize>,
}

impl StubProvider {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            failing: Vec::new(),
            calls: Mutex::new(0),
        }
    }

    pub fn ok() -> Self {
        Self::new(Behaviour::Ok)
    }

    /// Fail transiently for this pair, in either direction.
    pub fn failing_between(mut self, a: Coord, b: Coord) -> Self {
        self.failing.push((a, b));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn fails_for(&self, query: &RouteQuery) -> bool {
        let (o, d) = (query.origin, query.destination);
        self.failing
            .iter()
            .any(|&(a, b)| (a == o && b == d) || (a == d && b == o))
    }

    fn unavailable() -> ProviderError {
        ProviderError::from(ClientError::Api {
            status: 503,
            message: "stub unavailable".to_string(),
        })
    }

    fn answer(query: &RouteQuery) -> RouteResponse {
        let distance_m = query.origin.distance_m(&query.destination);
        RouteResponse::ok(RouteBody {
            legs: vec![RouteLeg {
                distance_m,
                duration_s: distance_m / (4.5 / 3.6),
                steps: vec![RouteStep {
                    path: vec![query.origin, query.destination],
                    travel_mode: query.mode.as_str().to_string(),
                    transit_detail: None,
                }],
            }],
            overview_path: None,
        })
    }
}

impl RouteProvider for StubProvider {
    async fn route(&self, query: &RouteQuery) -> Result<RouteResponse, ProviderError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if self.fails_for(query) {
            return Err(Self::unavailable());
        }
        match self.behaviour {
            Behaviour::Ok => Ok(Self::answer(query)),
            Behaviour::Status(status) => Ok(RouteResponse::status(status)),
            Behaviour::FailTimes(n) if call <= n => Err(Self::unavailable()),
            Behaviour::FailTimes(_) => Ok(Self::answer(query)),
            Behaviour::Unavailable => Err(Self::unavailable()),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Timeout)
            }
        }
    }
}

/// Proposer that replays queued answers, then reports itself unavailable.
#[derive(Default)]
pub struct ScriptedProposer {
    answers: Mutex<VecDeque<Result<Proposal, ProposalError>>>,
    requests: Mutex<Vec<ProposalRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProposer {
    pub fn new(answers: Vec<Result<Proposal, ProposalError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    /// Answers arrive only after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProposalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CourseProposer for ScriptedProposer {
    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ProposalError::Unavailable("script exhausted".to_string())))
    }
}

/// Search that answers from a fixed table keyed by query.
#[derive(Default)]
pub struct StaticSearch {
    by_query: HashMap<String, Vec<RawHit>>,
    fallback: Vec<RawHit>,
    untagged: bool,
    calls: Mutex<Vec<String>>,
}

impl StaticSearch {
    /// Every query returns `hits`.
    pub fn always(hits: Vec<RawHit>) -> Self {
        Self {
            fallback: hits,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>, hits: Vec<RawHit>) -> Self {
        self.by_query.insert(query.into(), hits);
        self
    }

    /// Answer like a real collaborator, without `source_query` on hits.
    pub fn untagged(mut self) -> Self {
        self.untagged = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PlaceSearch for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<RawHit>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());
        let hits = self.by_query.get(query).unwrap_or(&self.fallback);
        if self.untagged {
            return Ok(hits.clone());
        }
        Ok(hits
            .iter()
            .cloned()
            .map(|h| h.with_query(query))
            .collect())
    }
}
