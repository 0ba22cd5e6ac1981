//! Feasibility checks for a routed ordering.
//!
//! Pure functions of the pool, the ordering and its segments: the same
//! ordering always gets the same verdict, whoever proposed it.

use std::fmt;

use crate::domain::{CandidatePlace, RouteSegment, breaks_continuity};

use super::config::CategoryProfiles;

/// Ceilings an ordering is checked against.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_step_minutes: f64,
    pub max_step_distance_m: f64,
    /// Total spend ceiling for the whole group.
    pub budget: Option<f64>,
    pub group_size: u32,
}

/// One reason an ordering is infeasible.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    AdjacentDining {
        from: usize,
        to: usize,
    },
    StepTooLong {
        from: usize,
        to: usize,
        minutes: f64,
        limit: f64,
    },
    StepTooFar {
        from: usize,
        to: usize,
        metres: f64,
        limit: f64,
    },
    OverBudget {
        estimated: f64,
        ceiling: f64,
    },
    /// Segment count or endpoints do not match the ordering.
    MissingSegment {
        from: usize,
        to: usize,
    },
}

impl Violation {
    /// The step this violation is about, if any.
    pub fn step(&self) -> Option<(usize, usize)> {
        match *self {
            Violation::AdjacentDining { from, to }
            | Violation::StepTooLong { from, to, .. }
            | Violation::StepTooFar { from, to, .. }
            | Violation::MissingSegment { from, to } => Some((from, to)),
            Violation::OverBudget { .. } => None,
        }
    }

    /// How far past its limit a step violation is, as a ratio.
    pub fn excess(&self) -> f64 {
        match *self {
            Violation::StepTooLong { minutes, limit, .. } => minutes / limit.max(f64::EPSILON),
            Violation::StepTooFar { metres, limit, .. } => metres / limit.max(f64::EPSILON),
            Violation::OverBudget { estimated, ceiling } => estimated / ceiling.max(f64::EPSILON),
            Violation::AdjacentDining { .. } | Violation::MissingSegment { .. } => f64::INFINITY,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::AdjacentDining { from, to } => {
                write!(f, "stops {from} and {to} are both food or cafe")
            }
            Violation::StepTooLong {
                from,
                to,
                minutes,
                limit,
            } => write!(f, "step {from} -> {to} takes {minutes:.0} min (limit {limit:.0})"),
            Violation::StepTooFar {
                from,
                to,
                metres,
                limit,
            } => write!(f, "step {from} -> {to} is {metres:.0} m (limit {limit:.0})"),
            Violation::OverBudget { estimated, ceiling } => {
                write!(f, "estimated cost {estimated:.0} exceeds budget {ceiling:.0}")
            }
            Violation::MissingSegment { from, to } => {
                write!(f, "no route for step {from} -> {to}")
            }
        }
    }
}

/// Estimated spend for the whole group at these stops.
pub fn estimate_cost(
    pool: &[CandidatePlace],
    places: &[usize],
    profiles: &CategoryProfiles,
    group_size: u32,
) -> f64 {
    let per_person: f64 = places
        .iter()
        .map(|&i| profiles.get(pool[i].category).cost_per_person)
        .sum();
    per_person * group_size.max(1) as f64
}

/// Every violation of `limits` by `sequence` routed as `segments`.
///
/// `segments[k]` must connect `sequence[k]` to `sequence[k + 1]`. Degraded
/// segments are judged on their straight-line estimate.
pub fn verify(
    pool: &[CandidatePlace],
    sequence: &[usize],
    segments: &[RouteSegment],
    limits: &Limits,
    profiles: &CategoryProfiles,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (k, pair) in sequence.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        if breaks_continuity(pool[from].category, pool[to].category) {
            violations.push(Violation::AdjacentDining { from, to });
        }

        let Some(segment) = segments
            .get(k)
            .filter(|s| s.from_index == from && s.to_index == to)
        else {
            violations.push(Violation::MissingSegment { from, to });
            continue;
        };

        let minutes = segment.duration_mins();
        if minutes > limits.max_step_minutes {
            violations.push(Violation::StepTooLong {
                from,
                to,
                minutes,
                limit: limits.max_step_minutes,
            });
        }
        if segment.distance_m > limits.max_step_distance_m {
            violations.push(Violation::StepTooFar {
                from,
                to,
                metres: segment.distance_m,
                limit: limits.max_step_distance_m,
            });
        }
    }

    if let Some(ceiling) = limits.budget {
        let estimated = estimate_cost(pool, sequence, profiles, limits.group_size);
        if estimated > ceiling {
            violations.push(Violation::OverBudget { estimated, ceiling });
        }
    }

    violations
}
