//! Geographic coordinates and great-circle distance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Error returned when constructing a coordinate outside WGS84 bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoord {
    reason: &'static str,
}

/// A WGS84 latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use course_server::domain::Coord;
///
/// let city_hall = Coord::new(37.5663, 126.9779).unwrap();
/// let gwanghwamun = Coord::new(37.5759, 126.9769).unwrap();
/// let d = city_hall.distance_m(&gwanghwamun);
/// assert!((1_000.0..1_150.0).contains(&d));
///
/// assert!(Coord::new(91.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
}

impl Coord {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoord> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(InvalidCoord {
                reason: "latitude and longitude must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoord {
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidCoord {
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self { lat, lng })
    }

    /// Re-check bounds on a value that bypassed [`Coord::new`] (e.g. deserialized).
    pub fn validated(self) -> Result<Self, InvalidCoord> {
        Self::new(self.lat, self.lng)
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_m(&self, other: &Coord) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Fixed-point representation rounded to `decimals` places.
    ///
    /// Two coordinates that agree to `decimals` places map to the same pair.
    pub fn fixed_point(&self, decimals: u32) -> (i64, i64) {
        let scale = 10f64.powi(decimals as i32);
        (
            (self.lat * scale).round() as i64,
            (self.lng * scale).round() as i64,
        )
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Arithmetic mean of a set of coordinates.
///
/// Adequate for the city-scale spreads this crate works with; returns
/// `None` for an empty input.
pub fn centroid<I>(points: I) -> Option<Coord>
where
    I: IntoIterator<Item = Coord>,
{
    let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat;
        lng += p.lng;
        n += 1;
    }
    (n > 0).then(|| Coord {
        lat: lat / n as f64,
        lng: lng / n as f64,
    })
}

/// Offset `origin` by the given metres north and east.
///
/// Small-distance approximation, used to build nearby points in tests and
/// for grid bucketing.
pub fn offset_m(origin: Coord, north_m: f64, east_m: f64) -> Coord {
    let d_lat = north_m / 111_320.0;
    let d_lng = east_m / (111_320.0 * origin.lat.to_radians().cos());
    Coord {
        lat: origin.lat + d_lat,
        lng: origin.lng + d_lng,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seoul() -> Coord {
        Coord::new(37.5665, 126.9780).unwrap()
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Coord::new(90.5, 0.0).is_err());
        assert!(Coord::new(0.0, -180.5).is_err());
        assert!(Coord::new(f64::NAN, 0.0).is_err());
        assert!(Coord::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(seoul().distance_m(&seoul()), 0.0);
    }

    #[test]
    fn seoul_to_busan() {
        let busan = Coord::new(35.1796, 129.0756).unwrap();
        let d = seoul().distance_m(&busan);
        assert!((320_000.0..330_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn offset_matches_haversine() {
        let p = offset_m(seoul(), 30.0, 40.0);
        let d = seoul().distance_m(&p);
        assert!((d - 50.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn fixed_point_collapses_sub_precision_noise() {
        let a = Coord::new(37.566_501, 126.978_001).unwrap();
        let b = Coord::new(37.566_504, 126.977_998).unwrap();
        assert_eq!(a.fixed_point(5), b.fixed_point(5));
        assert_ne!(a.fixed_point(6), b.fixed_point(6));
    }

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(std::iter::empty::<Coord>()).is_none());
        let c = centroid([Coord { lat: 1.0, lng: 2.0 }, Coord { lat: 3.0, lng: 4.0 }]).unwrap();
        assert_eq!(c, Coord { lat: 2.0, lng: 3.0 });
    }
}
