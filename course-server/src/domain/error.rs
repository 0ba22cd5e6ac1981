//! Domain error types.
//!
//! These errors represent broken structural invariants in the domain
//! layer. They are distinct from collaborator and IO errors.

use super::geo::InvalidCoord;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    InvalidCoord(#[from] InvalidCoord),

    /// Course has no stops
    #[error("course must have at least one stop")]
    EmptyCourse,

    /// Index does not refer to a pool entry
    #[error("place index {index} out of range for pool of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Same place selected twice
    #[error("place index {0} selected more than once")]
    DuplicateIndex(usize),

    /// Sequence and selection differ in length
    #[error("sequence has {sequence} entries but {places} places were selected")]
    SequenceMismatch { places: usize, sequence: usize },

    /// Sequence visits something that was not selected, or visits it twice
    #[error("sequence index {0} is not a selected place")]
    NotInPlaces(usize),

    /// A selected place has no visit duration
    #[error("no visit duration for place index {0}")]
    MissingDuration(usize),

    /// Two dining stops are adjacent in the sequence
    #[error("dining stops adjacent at sequence position {position}")]
    ConsecutiveDining { position: usize },
}
