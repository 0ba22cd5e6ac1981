//! Computed route segments between consecutive stops.

use serde::{Deserialize, Serialize};

use super::{Coord, TransportMode};

/// Which backend produced a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Country-specific mapping backend (walking and driving only).
    Regional,
    /// Worldwide mapping backend, the only one that plans transit.
    General,
    /// Endpoints were close enough that no routing was needed.
    Direct,
    /// Synthesised great-circle estimate after every provider failed.
    StraightLine,
}

/// Line, vehicle and stop names for one transit step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_stops: Option<u32>,
}

/// One drawable piece of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub path: Vec<Coord>,
    pub travel_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_detail: Option<TransitDetail>,
}

/// Route between the stops at `from_index` and `to_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from_index: usize,
    pub to_index: usize,
    pub provider: Provider,
    pub distance_m: f64,
    pub duration_s: f64,
    pub steps: Vec<RouteStep>,
    /// Set only for straight-line estimates.
    pub degraded: bool,
}

impl RouteSegment {
    /// Zero-length segment for endpoints that coincide.
    pub fn direct(from_index: usize, to_index: usize, at: Coord, mode: TransportMode) -> Self {
        Self {
            from_index,
            to_index,
            provider: Provider::Direct,
            distance_m: 0.0,
            duration_s: 0.0,
            steps: vec![RouteStep {
                path: vec![at],
                travel_mode: mode.as_str().to_string(),
                transit_detail: None,
            }],
            degraded: false,
        }
    }

    /// Degraded great-circle estimate at a constant speed.
    pub fn straight_line(
        from_index: usize,
        to_index: usize,
        origin: Coord,
        destination: Coord,
        mode: TransportMode,
        speed_kmh: f64,
    ) -> Self {
        let distance_m = origin.distance_m(&destination);
        let speed_ms = (speed_kmh.max(0.1) * 1000.0) / 3600.0;
        Self {
            from_index,
            to_index,
            provider: Provider::StraightLine,
            distance_m,
            duration_s: distance_m / speed_ms,
            steps: vec![RouteStep {
                path: vec![origin, destination],
                travel_mode: mode.as_str().to_string(),
                transit_detail: None,
            }],
            degraded: true,
        }
    }

    /// Same route, relabelled for another pair of stop indices.
    pub fn reindexed(&self, from_index: usize, to_index: usize) -> Self {
        Self {
            from_index,
            to_index,
            ..self.clone()
        }
    }

    pub fn duration_mins(&self) -> f64 {
        self.duration_s / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::offset_m;

    #[test]
    fn straight_line_walking_speed() {
        let a = Coord::new(37.5665, 126.9780).unwrap();
        let b = offset_m(a, 1500.0, 0.0);
        let seg = RouteSegment::straight_line(0, 1, a, b, TransportMode::Walking, 4.5);
        assert!(seg.degraded);
        assert_eq!(seg.provider, Provider::StraightLine);
        // ~1.5 km at 4.5 km/h is ~20 minutes
        assert!((seg.duration_mins() - 20.0).abs() < 0.5, "{}", seg.duration_mins());
        assert_eq!(seg.steps[0].path, vec![a, b]);
    }

    #[test]
    fn direct_segment_is_not_degraded() {
        let a = Coord::new(37.5665, 126.9780).unwrap();
        let seg = RouteSegment::direct(2, 3, a, TransportMode::Driving);
        assert!(!seg.degraded);
        assert_eq!(seg.distance_m, 0.0);
        assert_eq!((seg.from_index, seg.to_index), (2, 3));
    }

    #[test]
    fn provider_serializes_snake_case() {
        let json = serde_json::to_string(&Provider::StraightLine).unwrap();
        assert_eq!(json, "\"straight_line\"");
    }
}
