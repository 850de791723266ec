//! Waypoint coordinates, bounding boxes and great-circle distances

use butterfly_common::{Error, Result};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in WGS84 coordinates
///
/// Serialized as `[lon, lat]`, the order used by GeoJSON and hosted routing APIs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Waypoint {
    pub lon: f64,
    pub lat: f64,
}

impl Waypoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that both coordinates are finite and inside the WGS84 range
    pub fn validate(&self) -> Result<()> {
        if !self.lon.is_finite() || !self.lat.is_finite() {
            return Err(Error::InvalidInput(format!(
                "coordinate {self} is not finite"
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidInput(format!(
                "coordinate {self} is outside the WGS84 range"
            )));
        }
        Ok(())
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl From<[f64; 2]> for Waypoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Waypoint> for [f64; 2] {
    fn from(w: Waypoint) -> Self {
        [w.lon, w.lat]
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

/// Validate every waypoint, reporting the first offending index
pub fn validate_waypoints(waypoints: &[Waypoint]) -> Result<()> {
    if waypoints.is_empty() {
        return Err(Error::InvalidInput("at least one waypoint required".into()));
    }
    for (i, w) in waypoints.iter().enumerate() {
        w.validate().map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("waypoint {i}: {msg}")),
            other => other,
        })?;
    }
    Ok(())
}

/// Great-circle distance in meters
pub fn haversine_distance(a: Waypoint, b: Waypoint) -> f64 {
    Haversine::distance(a.to_point(), b.to_point())
}

/// Minimal axis-aligned rectangle enclosing a set of coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Running min/max over every point. Returns `None` for an empty slice.
    pub fn from_points(points: &[Waypoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let mut bbox = BoundingBox {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for p in rest {
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
        }
        Some(bbox)
    }

    pub fn min(&self) -> Waypoint {
        Waypoint::new(self.min_lon, self.min_lat)
    }

    pub fn max(&self) -> Waypoint {
        Waypoint::new(self.max_lon, self.max_lat)
    }

    pub fn contains(&self, p: Waypoint) -> bool {
        (self.min_lon..=self.max_lon).contains(&p.lon)
            && (self.min_lat..=self.max_lat).contains(&p.lat)
    }

    /// GeoJSON `bbox` member order: `[west, south, east, north]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_serde_as_lon_lat_pair() {
        let w = Waypoint::new(-123.11554, 49.280747);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "[-123.11554,49.280747]");

        let back: Waypoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn test_waypoint_validation() {
        assert!(Waypoint::new(4.35, 50.85).validate().is_ok());
        assert!(Waypoint::new(f64::NAN, 50.85).validate().is_err());
        assert!(Waypoint::new(4.35, f64::INFINITY).validate().is_err());
        assert!(Waypoint::new(181.0, 0.0).validate().is_err());
        assert!(Waypoint::new(0.0, -90.5).validate().is_err());
    }

    #[test]
    fn test_validate_waypoints_reports_index() {
        let waypoints = [Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 95.0)];
        match validate_waypoints(&waypoints) {
            Err(Error::InvalidInput(msg)) => assert!(msg.starts_with("waypoint 1:"), "{msg}"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert!(validate_waypoints(&[]).is_err());
    }

    #[test]
    fn test_haversine_distance() {
        // One degree of latitude is ~111.2 km on the mean-radius sphere
        let d = haversine_distance(Waypoint::new(0.0, 0.0), Waypoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
        assert_eq!(haversine_distance(Waypoint::new(3.0, 4.0), Waypoint::new(3.0, 4.0)), 0.0);
    }

    #[test]
    fn test_bounding_box_running_min_max() {
        let points = [
            Waypoint::new(1.0, 5.0),
            Waypoint::new(-2.0, 3.0),
            Waypoint::new(4.0, -1.0),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min(), Waypoint::new(-2.0, -1.0));
        assert_eq!(bbox.max(), Waypoint::new(4.0, 5.0));
        assert_eq!(bbox.to_array(), [-2.0, -1.0, 4.0, 5.0]);
        assert!(points.iter().all(|p| bbox.contains(*p)));
        assert!(!bbox.contains(Waypoint::new(5.0, 0.0)));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }
}
