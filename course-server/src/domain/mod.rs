//! Domain types for the course planner.
//!
//! Everything here is plain data plus the invariants that hold for it:
//! coordinates are in WGS84 range, categories come from a closed set, and
//! a [`Course`] can only be built when its sequence is a valid permutation
//! of its selected stops with no adjacent dining stops.

mod category;
mod course;
mod error;
pub mod geo;
mod place;
mod route;
mod transport;

pub use category::{Category, breaks_continuity};
pub use course::Course;
pub use error::DomainError;
pub use geo::{Coord, InvalidCoord};
pub use place::{CandidatePlace, RawHit, SavedPlace, reindex};
pub use route::{Provider, RouteSegment, RouteStep, TransitDetail};
pub use transport::TransportMode;
