//! Mapping-provider capability and its JSON contract.
//!
//! Both the regional and the general provider speak the same shape:
//! the core posts `{origin, destination, mode}` and receives
//! `{status, route?: {legs, overview_path?}}`. A non-OK status is an
//! ordinary answer, not a transport failure.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::domain::{Coord, Provider, RouteSegment, RouteStep, TransportMode};

/// One routing request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteQuery {
    pub origin: Coord,
    pub destination: Coord,
    pub mode: TransportMode,
}

/// Provider answer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Ok,
    ZeroResults,
    NotFound,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
    #[serde(other)]
    Unrecognised,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteStatus::Ok => "OK",
            RouteStatus::ZeroResults => "ZERO_RESULTS",
            RouteStatus::NotFound => "NOT_FOUND",
            RouteStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            RouteStatus::RequestDenied => "REQUEST_DENIED",
            RouteStatus::InvalidRequest => "INVALID_REQUEST",
            RouteStatus::UnknownError => "UNKNOWN_ERROR",
            RouteStatus::Unrecognised => "UNRECOGNISED",
        };
        f.write_str(s)
    }
}

/// One leg of a provider route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteBody {
    pub legs: Vec<RouteLeg>,
    #[serde(default)]
    pub overview_path: Option<Vec<Coord>>,
}

/// Raw provider answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub status: RouteStatus,
    #[serde(default)]
    pub route: Option<RouteBody>,
}

impl RouteResponse {
    pub fn ok(body: RouteBody) -> Self {
        Self {
            status: RouteStatus::Ok,
            route: Some(body),
        }
    }

    pub fn status(status: RouteStatus) -> Self {
        Self {
            status,
            route: None,
        }
    }

    /// Convert an answer into a segment, or the reason it has none.
    ///
    /// An OK answer without legs counts as zero results.
    pub fn into_segment(
        self,
        from_index: usize,
        to_index: usize,
        provider: Provider,
        mode: TransportMode,
    ) -> Result<RouteSegment, ProviderError> {
        if self.status != RouteStatus::Ok {
            return Err(ProviderError::Status(self.status));
        }
        let body = match self.route {
            Some(body) if !body.legs.is_empty() => body,
            _ => return Err(ProviderError::Status(RouteStatus::ZeroResults)),
        };

        let distance_m = body.legs.iter().map(|l| l.distance_m).sum();
        let duration_s = body.legs.iter().map(|l| l.duration_s).sum();
        let mut steps: Vec<RouteStep> = body.legs.into_iter().flat_map(|l| l.steps).collect();
        if steps.is_empty() {
            if let Some(path) = body.overview_path.filter(|p| !p.is_empty()) {
                steps.push(RouteStep {
                    path,
                    travel_mode: mode.as_str().to_string(),
                    transit_detail: None,
                });
            }
        }

        Ok(RouteSegment {
            from_index,
            to_index,
            provider,
            distance_m,
            duration_s,
            steps,
            degraded: false,
        })
    }
}

/// Errors from a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Provider answered, but not with a route
    #[error("provider answered {0}")]
    Status(RouteStatus),

    /// Call exceeded its deadline
    #[error("provider call timed out")]
    Timeout,

    /// No endpoint configured for this provider
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Worth retrying against the same provider.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Client(e) => e.is_transient(),
            ProviderError::Timeout => true,
            ProviderError::Status(s) => {
                matches!(s, RouteStatus::OverQueryLimit | RouteStatus::UnknownError)
            }
            ProviderError::NotConfigured(_) => false,
        }
    }

    /// The provider is sure there is no route between the points.
    pub fn is_no_route(&self) -> bool {
        matches!(
            self,
            ProviderError::Status(RouteStatus::ZeroResults | RouteStatus::NotFound)
        )
    }
}

/// A routing backend.
///
/// Implementations must not retry or time out internally beyond their
/// transport timeout; the router owns the retry and fallback policy.
pub trait RouteProvider: Send + Sync {
    fn route(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<RouteResponse, ProviderError>> + Send;
}

impl<P: RouteProvider> RouteProvider for std::sync::Arc<P> {
    fn route(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<RouteResponse, ProviderError>> + Send {
        (**self).route(query)
    }
}
