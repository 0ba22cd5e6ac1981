//! Course assembly: choose stops, order them, check the ordering against
//! routed travel times, and retry within a bounded budget.

mod assembler;
mod config;
mod proposal;
mod select;
mod verify;

use serde::Serialize;

use crate::domain::{Course, DomainError, RouteSegment, TransportMode};

pub use assembler::CourseAssembler;
pub use config::{AssemblyConfig, CategoryProfile, CategoryProfiles, StepDistanceLimits};
pub use proposal::{
    CourseProposer, GreedyProposer, HttpCourseProposer, Plan, Proposal, ProposalConstraints,
    ProposalError, ProposalRequest, ProposerBackend, sanitize,
};
pub use select::{is_continuous, nearest_neighbour, repair_continuity, select_stops};
pub use verify::{Limits, Violation, estimate_cost, verify};

/// Per-request assembly input.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub theme: String,
    pub stop_count: usize,
    pub mode: TransportMode,
    /// Spend ceiling for the whole group (KRW).
    pub budget: Option<f64>,
    pub group_size: u32,
}

/// Something the caller should know about an otherwise successful course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CourseWarning {
    /// No step could be routed; every segment is a straight-line estimate.
    Unrouted,
    /// Some steps are straight-line estimates.
    DegradedSegments { count: usize },
    /// No ordering met every constraint; this is the best one found.
    ConstraintUnsatisfiable { violations: Vec<String> },
    /// The proposer failed and the deterministic plan was used instead.
    ProposalFallback { reason: String },
    BudgetExceeded { estimated: f64, ceiling: f64 },
    /// Fewer stops than requested: the pool was too small, or surplus
    /// food or cafe stops were dropped to keep them apart.
    Shortened { requested: usize, delivered: usize },
}

/// A finished course with its routes.
#[derive(Debug, Clone)]
pub struct AssembledCourse {
    pub course: Course,
    /// `segments[k]` connects `sequence[k]` to `sequence[k + 1]`.
    pub segments: Vec<RouteSegment>,
    pub warnings: Vec<CourseWarning>,
    pub iterations: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("cannot construct course: {found} candidates, need at least {required}")]
    InsufficientCandidates { found: usize, required: usize },

    #[error("a course needs at least one stop")]
    NoStops,

    #[error("{dining} pinned food/cafe stops cannot be kept apart in a {stops}-stop course")]
    PinnedDiningConflict { dining: usize, stops: usize },

    #[error("no ordering was attempted")]
    Exhausted,

    #[error(transparent)]
    Domain(#[from] DomainError),
}
