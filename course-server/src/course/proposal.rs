//! Course proposals: the capability, its JSON contract, and sanitising
//! untrusted answers into a usable [`Plan`].
//!
//! A proposer only suggests which stops to visit and in what order.
//! Whatever it answers is clamped here and then verified separately, so a
//! proposer that returns nonsense costs an iteration, never correctness.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::select;
use crate::client::{ClientConfig, ClientError, JsonClient};
use crate::domain::{CandidatePlace, TransportMode};

/// Errors from a proposer call. All of them send the assembler to its
/// deterministic fallback.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("proposer timed out")]
    Timeout,

    #[error("proposer unavailable: {0}")]
    Unavailable(String),
}

/// Constraints the proposer is asked to respect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalConstraints {
    pub max_step_minutes: f64,
    pub max_step_distance_m: f64,
    pub max_per_category: usize,
    pub no_adjacent_dining: bool,
}

/// The structured prompt sent to a proposer.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalRequest {
    pub theme: String,
    pub stop_count: usize,
    pub transport: TransportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub group_size: u32,
    pub candidates: Vec<CandidatePlace>,
    pub constraints: ProposalConstraints,
    /// Stops that caused violations in earlier rounds.
    pub avoid: Vec<usize>,
    /// Human-readable problems with the previous answer.
    pub feedback: Vec<String>,
}

/// A proposer's answer, as received. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(default)]
    pub selected_places: Vec<i64>,
    #[serde(default)]
    pub sequence: Vec<i64>,
    /// Minutes per stop, keyed by pool index as a string.
    #[serde(default)]
    pub estimated_duration: BTreeMap<String, f64>,
}

/// A sanitised selection and ordering of pool indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub places: Vec<usize>,
    pub sequence: Vec<usize>,
    /// Visit durations supplied by the proposer, already range-checked.
    pub durations: BTreeMap<usize, u32>,
}

impl Plan {
    /// A plan visiting `places` in the given order.
    pub fn ordered(places: Vec<usize>) -> Self {
        Self {
            sequence: places.clone(),
            places,
            durations: BTreeMap::new(),
        }
    }
}

/// Generates candidate selections and orderings.
pub trait CourseProposer: Send + Sync {
    fn propose(
        &self,
        request: &ProposalRequest,
    ) -> impl Future<Output = Result<Proposal, ProposalError>> + Send;
}

impl<P: CourseProposer> CourseProposer for std::sync::Arc<P> {
    fn propose(
        &self,
        request: &ProposalRequest,
    ) -> impl Future<Output = Result<Proposal, ProposalError>> + Send {
        (**self).propose(request)
    }
}

/// Proposer behind an HTTP endpoint (typically an LLM gateway).
#[derive(Debug, Clone)]
pub struct HttpCourseProposer {
    client: JsonClient,
}

impl HttpCourseProposer {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: JsonClient::new(config)?,
        })
    }
}

impl CourseProposer for HttpCourseProposer {
    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        Ok(self.client.post("", request).await?)
    }
}

/// Deterministic proposer: trust-ranked selection, nearest-neighbour order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyProposer;

impl GreedyProposer {
    pub fn plan(&self, request: &ProposalRequest) -> Plan {
        let avoid: HashSet<usize> = request.avoid.iter().copied().collect();
        let places = select::select_stops(
            &request.candidates,
            request.stop_count,
            request.constraints.max_per_category,
            &avoid,
        );
        let sequence = select::nearest_neighbour(&request.candidates, &places, 0);
        Plan {
            places,
            sequence,
            durations: BTreeMap::new(),
        }
    }
}

impl CourseProposer for GreedyProposer {
    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        let plan = self.plan(request);
        let as_i64 = |v: &[usize]| v.iter().map(|&i| i as i64).collect();
        Ok(Proposal {
            selected_places: as_i64(&plan.places),
            sequence: as_i64(&plan.sequence),
            estimated_duration: BTreeMap::new(),
        })
    }
}

/// The configured proposer.
#[derive(Debug, Clone)]
pub enum ProposerBackend {
    Http(HttpCourseProposer),
    Greedy(GreedyProposer),
}

impl CourseProposer for ProposerBackend {
    async fn propose(&self, request: &ProposalRequest) -> Result<Proposal, ProposalError> {
        match self {
            ProposerBackend::Http(p) => p.propose(request).await,
            ProposerBackend::Greedy(p) => p.propose(request).await,
        }
    }
}

/// Clamp an untrusted proposal into a plan over `pool`.
///
/// Out-of-range and repeated indices are dropped. Pinned places are
/// forced in, the selection is trimmed or padded (by trust order) to
/// `stop_count`, and the sequence is repaired to be a permutation of the
/// selection. Durations outside `minutes_range` are discarded. Returns
/// `None` when the proposal names no usable stop at all.
pub fn sanitize(
    proposal: &Proposal,
    pool: &[CandidatePlace],
    stop_count: usize,
    max_per_category: usize,
    minutes_range: (u32, u32),
) -> Option<Plan> {
    let in_pool = |i: &i64| usize::try_from(*i).ok().filter(|&i| i < pool.len());

    let mut seen = HashSet::new();
    let proposed: Vec<usize> = proposal
        .selected_places
        .iter()
        .filter_map(in_pool)
        .filter(|i| seen.insert(*i))
        .collect();
    if proposed.is_empty() {
        return None;
    }

    let stop_count = stop_count.min(pool.len());
    let pinned: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].is_user_saved).collect();

    let mut places: Vec<usize> = pinned.iter().copied().take(stop_count).collect();
    for i in proposed {
        if places.len() >= stop_count {
            break;
        }
        if !places.contains(&i) {
            places.push(i);
        }
    }
    if places.len() < stop_count {
        let padding = select::select_stops(pool, stop_count, max_per_category, &HashSet::new());
        for i in padding {
            if places.len() >= stop_count {
                break;
            }
            if !places.contains(&i) {
                places.push(i);
            }
        }
    }

    let chosen: HashSet<usize> = places.iter().copied().collect();
    let mut ordered = HashSet::new();
    let mut sequence: Vec<usize> = proposal
        .sequence
        .iter()
        .filter_map(in_pool)
        .filter(|i| chosen.contains(i) && ordered.insert(*i))
        .collect();
    sequence.extend(places.iter().filter(|i| !ordered.contains(i)));

    let (lo, hi) = minutes_range;
    let durations = proposal
        .estimated_duration
        .iter()
        .filter_map(|(key, &minutes)| {
            let index = key.trim().parse::<usize>().ok()?;
            let minutes = minutes.round();
            (chosen.contains(&index) && minutes >= lo as f64 && minutes <= hi as f64)
                .then_some((index, minutes as u32))
        })
        .collect();

    Some(Plan {
        places,
        sequence,
        durations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category::{Cafe, Food, Landmark, Museum, Shopping};
    use crate::test_support::pool;

    fn sample_pool() -> Vec<CandidatePlace> {
        pool(&[
            (Museum, 0.0, 0.0, true),
            (Food, 100.0, 0.0, false),
            (Landmark, 200.0, 0.0, false),
            (Cafe, 300.0, 0.0, false),
            (Shopping, 400.0, 0.0, false),
            (Landmark, 500.0, 0.0, false),
        ])
    }

    fn proposal(selected: &[i64], sequence: &[i64]) -> Proposal {
        Proposal {
            selected_places: selected.to_vec(),
            sequence: sequence.to_vec(),
            estimated_duration: BTreeMap::new(),
        }
    }

    #[test]
    fn drops_garbage_indices() {
        let pool = sample_pool();
        let plan = sanitize(&proposal(&[2, -1, 99, 2, 3], &[3, 2]), &pool, 3, 2, (10, 240)).unwrap();

        assert_eq!(plan.places, vec![0, 2, 3]);
        assert_eq!(plan.sequence, vec![3, 2, 0]);
    }

    #[test]
    fn forces_pinned_in_and_trims() {
        let pool = sample_pool();
        let plan = sanitize(&proposal(&[1, 2, 3, 4, 5], &[]), &pool, 3, 2, (10, 240)).unwrap();

        assert_eq!(plan.places.len(), 3);
        assert!(plan.places.contains(&0));
        assert_eq!(plan.sequence, plan.places);
    }

    #[test]
    fn pads_short_selection_by_trust() {
        let pool = sample_pool();
        let plan = sanitize(&proposal(&[4], &[4]), &pool, 4, 2, (10, 240)).unwrap();

        assert_eq!(plan.places.len(), 4);
        assert_eq!(plan.sequence[0], 4);
        let unique: HashSet<_> = plan.sequence.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn empty_proposal_is_unusable() {
        let pool = sample_pool();
        assert!(sanitize(&proposal(&[-3, 42], &[0]), &pool, 3, 2, (10, 240)).is_none());
        assert!(sanitize(&Proposal::default(), &pool, 3, 2, (10, 240)).is_none());
    }

    #[test]
    fn durations_are_range_checked() {
        let pool = sample_pool();
        let mut p = proposal(&[0, 2, 3], &[0, 2, 3]);
        p.estimated_duration = BTreeMap::from([
            ("0".to_string(), 75.4),
            ("2".to_string(), 5.0),
            ("3".to_string(), 600.0),
            ("4".to_string(), 30.0),
            ("x".to_string(), 30.0),
        ]);

        let plan = sanitize(&p, &pool, 3, 2, (10, 240)).unwrap();

        assert_eq!(plan.durations, BTreeMap::from([(0, 75)]));
    }

    #[test]
    fn proposal_parses_loose_json() {
        let json = r#"{"selected_places": [3, 1], "estimated_duration": {"3": 45}}"#;
        let p: Proposal = serde_json::from_str(json).unwrap();

        assert_eq!(p.selected_places, vec![3, 1]);
        assert!(p.sequence.is_empty());
        assert_eq!(p.estimated_duration["3"], 45.0);
    }

    #[tokio::test]
    async fn greedy_proposer_keeps_pinned() {
        let pool = sample_pool();
        let request = ProposalRequest {
            theme: "전시".to_string(),
            stop_count: 4,
            transport: TransportMode::Walking,
            budget: None,
            group_size: 2,
            candidates: pool.clone(),
            constraints: ProposalConstraints {
                max_step_minutes: 30.0,
                max_step_distance_m: 3_000.0,
                max_per_category: 2,
                no_adjacent_dining: true,
            },
            avoid: vec![],
            feedback: vec![],
        };

        let answer = GreedyProposer.propose(&request).await.unwrap();
        let plan = sanitize(&answer, &pool, 4, 2, (10, 240)).unwrap();

        assert_eq!(plan.places.len(), 4);
        assert!(plan.places.contains(&0));
    }
}
