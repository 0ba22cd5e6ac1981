//! The propose, route and verify loop.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::{CandidatePlace, Course, RouteSegment};
use crate::routing::{RouteProvider, SegmentRouter, Waypoint};

use super::config::AssemblyConfig;
use super::proposal::{
    CourseProposer, GreedyProposer, Plan, ProposalConstraints, ProposalError, ProposalRequest, sanitize,
};
use super::select::{nearest_neighbour, repair_continuity, substitute};
use super::verify::{Limits, Violation, verify};
use super::{AssembledCourse, AssemblyError, AssemblyRequest, CourseWarning};

/// One routed and verified ordering.
struct Attempt {
    plan: Plan,
    segments: Vec<RouteSegment>,
    violations: Vec<Violation>,
}

impl Attempt {
    fn travel_seconds(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s).sum()
    }

    /// Fewer violations wins, then less travel.
    fn better_than(&self, other: &Attempt) -> bool {
        match self.violations.len().cmp(&other.violations.len()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.travel_seconds() < other.travel_seconds(),
        }
    }
}

/// Builds courses from a ranked candidate pool.
///
/// Each round produces a plan (from the proposer, a nearest-neighbour
/// reordering, or a substitution of the worst stop), routes it, and
/// verifies it. Rounds stop at the first feasible plan, after
/// `max_iterations`, or once `time_budget` is spent; the best plan seen
/// is returned with a warning if it is still infeasible.
pub struct CourseAssembler<P, R, G> {
    proposer: P,
    router: Arc<SegmentRouter<R, G>>,
    config: AssemblyConfig,
}

impl<P, R, G> CourseAssembler<P, R, G>
where
    P: CourseProposer,
    R: RouteProvider,
    G: RouteProvider,
{
    pub fn new(proposer: P, router: Arc<SegmentRouter<R, G>>, config: AssemblyConfig) -> Self {
        Self {
            proposer,
            router,
            config,
        }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn router(&self) -> &SegmentRouter<R, G> {
        &self.router
    }

    pub async fn assemble(
        &self,
        pool: &[CandidatePlace],
        request: &AssemblyRequest,
    ) -> Result<AssembledCourse, AssemblyError> {
        if pool.len() < self.config.min_candidates {
            return Err(AssemblyError::InsufficientCandidates {
                found: pool.len(),
                required: self.config.min_candidates,
            });
        }
        if request.stop_count == 0 {
            return Err(AssemblyError::NoStops);
        }

        let stop_count = request.stop_count.min(pool.len());
        let limits = Limits {
            max_step_minutes: self.config.max_step_minutes,
            max_step_distance_m: self.config.max_step_distance.for_mode(request.mode),
            budget: request.budget,
            group_size: request.group_size,
        };
        let started = Instant::now();
        let mut warnings = Vec::new();
        let mut avoid = HashSet::new();
        let mut best: Option<Attempt> = None;
        let mut iterations = 0;
        let mut proposer_up = true;

        for iteration in 0..self.config.max_iterations.max(1) {
            let elapsed = started.elapsed();
            if iteration > 0 && elapsed >= self.config.time_budget {
                warn!(iteration, elapsed_ms = elapsed.as_millis() as u64, "assembly time budget spent");
                break;
            }
            let remaining = self.config.time_budget.saturating_sub(elapsed);
            iterations = iteration + 1;

            let plan = match &best {
                None => {
                    let request = self.proposal_request(pool, request, stop_count, &avoid, Vec::new());
                    match self.ask_proposer(pool, &request, remaining).await {
                        Ok(plan) => plan,
                        Err(reason) => {
                            warn!(%reason, "proposer failed, using deterministic plan");
                            proposer_up = false;
                            warnings.push(CourseWarning::ProposalFallback { reason });
                            GreedyProposer.plan(&request)
                        }
                    }
                }
                Some(prev) if iteration % 2 == 1 => {
                    let mut plan = prev.plan.clone();
                    plan.sequence = nearest_neighbour(pool, &plan.places, iteration / 2);
                    plan
                }
                Some(prev) => {
                    let mut fallback = prev.plan.clone();
                    self.substitute_worst(pool, &mut fallback, &prev.violations, &mut avoid);
                    let feedback = prev.violations.iter().map(ToString::to_string).collect();
                    let request = self.proposal_request(pool, request, stop_count, &avoid, feedback);
                    let alternate = if proposer_up {
                        self.ask_proposer(pool, &request, remaining).await
                    } else {
                        Err("proposer already failed".to_string())
                    };
                    match alternate {
                        Ok(plan) => plan,
                        Err(reason) => {
                            debug!(%reason, "no alternate proposal, reordering substituted plan");
                            fallback.sequence = nearest_neighbour(pool, &fallback.places, 0);
                            fallback
                        }
                    }
                }
            };

            let plan = self.enforce_continuity(pool, plan, &avoid)?;
            let waypoints: Vec<Waypoint> = plan
                .sequence
                .iter()
                .map(|&i| Waypoint::new(i, pool[i].coordinates))
                .collect();
            let segments = self.router.route_waypoints(&waypoints, request.mode).await;
            let violations = verify(pool, &plan.sequence, &segments, &limits, &self.config.profiles);

            debug!(
                iteration,
                stops = plan.sequence.len(),
                violations = violations.len(),
                "verified ordering"
            );

            let attempt = Attempt {
                plan,
                segments,
                violations,
            };
            let feasible = attempt.violations.is_empty();
            if best.as_ref().is_none_or(|b| attempt.better_than(b)) {
                best = Some(attempt);
            }
            if feasible {
                break;
            }
        }

        let best = best.ok_or(AssemblyError::Exhausted)?;
        self.finish(pool, best, request.stop_count, iterations, started.elapsed(), warnings)
    }

    fn proposal_request(
        &self,
        pool: &[CandidatePlace],
        request: &AssemblyRequest,
        stop_count: usize,
        avoid: &HashSet<usize>,
        feedback: Vec<String>,
    ) -> ProposalRequest {
        let mut avoid: Vec<usize> = avoid.iter().copied().collect();
        avoid.sort_unstable();
        ProposalRequest {
            theme: request.theme.clone(),
            stop_count,
            transport: request.mode,
            budget: request.budget,
            group_size: request.group_size,
            candidates: pool.to_vec(),
            constraints: ProposalConstraints {
                max_step_minutes: self.config.max_step_minutes,
                max_step_distance_m: self.config.max_step_distance.for_mode(request.mode),
                max_per_category: self.config.max_per_category,
                no_adjacent_dining: true,
            },
            avoid,
            feedback,
        }
    }

    /// Ask the proposer and sanitise its answer. The error is a reason
    /// suitable for a warning.
    async fn ask_proposer(
        &self,
        pool: &[CandidatePlace],
        request: &ProposalRequest,
        remaining: Duration,
    ) -> Result<Plan, String> {
        let limit = self.config.proposal_timeout.min(remaining);
        let answer = tokio::time::timeout(limit, self.proposer.propose(request))
            .await
            .unwrap_or(Err(ProposalError::Timeout))
            .map_err(|e| e.to_string())?;

        sanitize(
            &answer,
            pool,
            request.stop_count,
            self.config.max_per_category,
            self.config.override_minutes,
        )
        .ok_or_else(|| "proposal named no usable stop".to_string())
    }

    /// Replace the stop most responsible for the worst violation.
    fn substitute_worst(
        &self,
        pool: &[CandidatePlace],
        plan: &mut Plan,
        violations: &[Violation],
        avoid: &mut HashSet<usize>,
    ) {
        let worst_step = violations
            .iter()
            .filter(|v| matches!(v, Violation::StepTooLong { .. } | Violation::StepTooFar { .. }))
            .max_by(|a, b| a.excess().partial_cmp(&b.excess()).unwrap_or(std::cmp::Ordering::Equal))
            .and_then(Violation::step);

        let cap = self.config.max_per_category;
        if let Some((from, to)) = worst_step {
            let (out, anchor) = if pool[to].is_user_saved {
                (from, pool[to].coordinates)
            } else {
                (to, pool[from].coordinates)
            };
            let swapped = substitute(pool, plan, out, avoid, cap, |p| {
                Some(p.coordinates.distance_m(&anchor))
            });
            if let Some(with) = swapped {
                debug!(out, with, "substituted distant stop");
                avoid.insert(out);
            }
            return;
        }

        if violations.iter().any(|v| matches!(v, Violation::OverBudget { .. })) {
            let profiles = &self.config.profiles;
            let cost = |i: usize| profiles.get(pool[i].category).cost_per_person;
            let priciest = plan
                .places
                .iter()
                .copied()
                .filter(|&i| !pool[i].is_user_saved)
                .max_by(|&a, &b| cost(a).partial_cmp(&cost(b)).unwrap_or(std::cmp::Ordering::Equal));
            if let Some(out) = priciest {
                let ceiling = cost(out);
                let swapped = substitute(pool, plan, out, avoid, cap, |p| {
                    let c = profiles.get(p.category).cost_per_person;
                    (c < ceiling).then_some(c)
                });
                if let Some(with) = swapped {
                    debug!(out, with, "substituted expensive stop");
                    avoid.insert(out);
                }
            }
        }
    }

    /// Make sure no two dining stops are adjacent.
    ///
    /// Surplus unpinned dining stops are swapped for the nearest
    /// non-dining candidate, or dropped when there is none.
    fn enforce_continuity(
        &self,
        pool: &[CandidatePlace],
        mut plan: Plan,
        avoid: &HashSet<usize>,
    ) -> Result<Plan, AssemblyError> {
        while !repair_continuity(pool, &mut plan.sequence) {
            let surplus = plan
                .sequence
                .iter()
                .rev()
                .copied()
                .find(|&i| pool[i].category.is_dining() && !pool[i].is_user_saved);
            let Some(out) = surplus else {
                let dining = plan
                    .places
                    .iter()
                    .filter(|&&i| pool[i].category.is_dining())
                    .count();
                return Err(AssemblyError::PinnedDiningConflict {
                    dining,
                    stops: plan.places.len(),
                });
            };

            let at = pool[out].coordinates;
            let swapped = substitute(pool, &mut plan, out, avoid, self.config.max_per_category, |p| {
                (!p.category.is_dining()).then(|| p.coordinates.distance_m(&at))
            });
            if swapped.is_none() {
                debug!(out, "dropping surplus dining stop");
                plan.places.retain(|&i| i != out);
                plan.sequence.retain(|&i| i != out);
                plan.durations.remove(&out);
            }
        }
        Ok(plan)
    }

    fn finish(
        &self,
        pool: &[CandidatePlace],
        best: Attempt,
        requested: usize,
        iterations: usize,
        elapsed: Duration,
        mut warnings: Vec<CourseWarning>,
    ) -> Result<AssembledCourse, AssemblyError> {
        let Attempt {
            plan,
            segments,
            violations,
        } = best;

        let durations: BTreeMap<usize, u32> = plan
            .places
            .iter()
            .map(|&i| {
                let minutes = plan
                    .durations
                    .get(&i)
                    .copied()
                    .unwrap_or_else(|| self.config.profiles.get(pool[i].category).visit_minutes);
                (i, minutes)
            })
            .collect();
        let course = Course::new(pool, plan.places, plan.sequence, durations)?;

        if course.len() < requested {
            warnings.push(CourseWarning::Shortened {
                requested,
                delivered: course.len(),
            });
        }
        if !violations.is_empty() {
            for v in &violations {
                if let Violation::OverBudget { estimated, ceiling } = *v {
                    warnings.push(CourseWarning::BudgetExceeded { estimated, ceiling });
                }
            }
            warnings.push(CourseWarning::ConstraintUnsatisfiable {
                violations: violations.iter().map(ToString::to_string).collect(),
            });
        }

        let degraded = segments.iter().filter(|s| s.degraded).count();
        if degraded > 0 && degraded == segments.len() {
            warnings.push(CourseWarning::Unrouted);
        } else if degraded > 0 {
            warnings.push(CourseWarning::DegradedSegments { count: degraded });
        }

        info!(
            stops = course.len(),
            iterations,
            violations = violations.len(),
            degraded,
            elapsed_ms = elapsed.as_millis() as u64,
            "assembled course"
        );

        Ok(AssembledCourse {
            course,
            segments,
            warnings,
            iterations,
        })
    }
}
