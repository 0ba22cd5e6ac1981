//! The request-scoped pipeline: validate, search, score, focus, assemble,
//! and the task registry that runs it off the request path.

mod output;
mod request;
mod runner;
mod tasks;

use crate::course::AssemblyError;
use crate::search::SearchError;

pub use output::{CourseOutput, CourseSummary};
pub use request::{DEFAULT_GROUP_SIZE, DateRange, GroupSize, MAX_STOPS, PlanRequest, ValidRequest};
pub use runner::Pipeline;
pub use tasks::{TaskHandle, TaskId, TaskRegistry, TaskState, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("place search failed: {0}")]
    Search(#[from] SearchError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl PipelineError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidRequest(_)
                | PipelineError::Assembly(
                    AssemblyError::InsufficientCandidates { .. }
                        | AssemblyError::NoStops
                        | AssemblyError::PinnedDiningConflict { .. }
                )
        )
    }
}
