//! Web layer: submit a course request, poll its task, fetch the result.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::{AppState, LivePipeline};
