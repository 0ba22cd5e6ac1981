//! Themed multi-stop course planner.
//!
//! Given a theme and a location, the server gathers candidate places,
//! assembles an ordered course under time, budget and category
//! constraints, and routes each step through a region-dependent chain of
//! mapping providers, falling back to straight-line estimates.

pub mod candidates;
pub mod client;
pub mod cluster;
pub mod config;
pub mod course;
pub mod domain;
pub mod pipeline;
pub mod routing;
pub mod search;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;
