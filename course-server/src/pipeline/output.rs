//! The pipeline's result document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::course::{AssembledCourse, CourseWarning};
use crate::domain::{CandidatePlace, RouteSegment, RouteStep};

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutput {
    /// Selected places in selection order; each keeps its pool index.
    pub places: Vec<CandidatePlace>,
    pub sequence: Vec<usize>,
    /// Visit minutes keyed by pool index.
    pub estimated_duration: BTreeMap<usize, u32>,
    /// Step paths per consecutive pair, when any segment has steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_paths: Option<Vec<Vec<RouteStep>>>,
    pub segments: Vec<RouteSegment>,
    pub warnings: Vec<CourseWarning>,
}

impl CourseOutput {
    pub fn new(pool: &[CandidatePlace], assembled: AssembledCourse) -> Self {
        let AssembledCourse {
            course,
            segments,
            warnings,
            ..
        } = assembled;

        let places = course.places().iter().map(|&i| pool[i].clone()).collect();
        let route_paths = segments
            .iter()
            .any(|s| !s.steps.is_empty())
            .then(|| segments.iter().map(|s| s.steps.clone()).collect());

        Self {
            places,
            sequence: course.sequence().to_vec(),
            estimated_duration: course.durations().clone(),
            route_paths,
            segments,
            warnings,
        }
    }

    /// Visit minutes plus travel minutes.
    pub fn total_minutes(&self) -> f64 {
        let visits: u32 = self.estimated_duration.values().sum();
        let travel: f64 = self.segments.iter().map(RouteSegment::duration_mins).sum();
        visits as f64 + travel
    }
}

/// Summary returned with a finished task's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub stops: usize,
    pub total_minutes: f64,
    pub warnings: usize,
}

impl From<&CourseOutput> for CourseSummary {
    fn from(output: &CourseOutput) -> Self {
        Self {
            stops: output.sequence.len(),
            total_minutes: output.total_minutes(),
            warnings: output.warnings.len(),
        }
    }
}
