//! Per-segment choice of routing provider.

use std::fmt;

use crate::domain::{Coord, Provider, TransportMode};

/// Bounding box in which the regional provider is authoritative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportedRegion {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl SupportedRegion {
    /// South Korea, including Jeju and Ulleungdo.
    pub const KOREA: SupportedRegion = SupportedRegion {
        min_lat: 33.0,
        max_lat: 38.6,
        min_lng: 124.5,
        max_lng: 132.0,
    };

    pub fn contains(&self, point: Coord) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

impl Default for SupportedRegion {
    fn default() -> Self {
        Self::KOREA
    }
}

/// Why a provider was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Only the general provider models public transit.
    TransitNeedsGeneral,
    /// Both endpoints lie inside the supported region.
    InsideRegion,
    /// At least one endpoint lies outside the supported region.
    OutsideRegion,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionReason::TransitNeedsGeneral => "transit requires general provider",
            SelectionReason::InsideRegion => "both endpoints inside supported region",
            SelectionReason::OutsideRegion => "endpoint outside supported region",
        })
    }
}

/// Provider chain for one segment. The straight-line estimate always
/// follows the chain and is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub primary: Provider,
    pub fallback: Option<Provider>,
    pub reason: SelectionReason,
}

impl Selection {
    pub fn chain(&self) -> impl Iterator<Item = Provider> {
        std::iter::once(self.primary).chain(self.fallback)
    }
}

/// Pure function of (origin, destination, mode).
#[derive(Debug, Clone, Default)]
pub struct ProviderSelector {
    region: SupportedRegion,
}

impl ProviderSelector {
    pub fn new(region: SupportedRegion) -> Self {
        Self { region }
    }

    pub fn region(&self) -> &SupportedRegion {
        &self.region
    }

    pub fn select(&self, origin: Coord, destination: Coord, mode: TransportMode) -> Selection {
        if mode == TransportMode::Transit {
            return Selection {
                primary: Provider::General,
                fallback: None,
                reason: SelectionReason::TransitNeedsGeneral,
            };
        }

        if self.region.contains(origin) && self.region.contains(destination) {
            Selection {
                primary: Provider::Regional,
                fallback: Some(Provider::General),
                reason: SelectionReason::InsideRegion,
            }
        } else {
            Selection {
                primary: Provider::General,
                fallback: None,
                reason: SelectionReason::OutsideRegion,
            }
        }
    }
}
