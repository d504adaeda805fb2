// src/geofence.rs
//! Waypoint geofencing with great-circle distances

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A named circular region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            radius_m,
        }
    }

    /// Distance in meters from this waypoint's center
    pub fn distance_to(&self, lat: f64, lon: f64) -> f64 {
        distance_m(lat, lon, self.lat, self.lon)
    }
}

/// Closest waypoint seen while scanning
#[derive(Debug, Clone, PartialEq)]
pub struct NearestWaypoint {
    pub name: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceResult {
    Inside { name: String, distance_m: f64 },
    Outside { nearest: Option<NearestWaypoint> },
}

impl GeofenceResult {
    /// Name of the containing waypoint, if any
    pub fn place(&self) -> Option<&str> {
        match self {
            GeofenceResult::Inside { name, .. } => Some(name),
            GeofenceResult::Outside { .. } => None,
        }
    }
}

/// Haversine distance in meters between two points given in decimal degrees
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Classify a position against the waypoint list.
///
/// Waypoints are checked in order and the first one whose radius contains
/// the position wins, even if a later overlapping one is closer. Otherwise
/// the nearest waypoint is reported, earliest first on ties.
pub fn check_location(lat: f64, lon: f64, waypoints: &[Waypoint]) -> GeofenceResult {
    let mut nearest: Option<NearestWaypoint> = None;

    for wp in waypoints {
        let d = wp.distance_to(lat, lon);
        if d <= wp.radius_m {
            return GeofenceResult::Inside {
                name: wp.name.clone(),
                distance_m: d,
            };
        }

        if nearest.as_ref().map_or(true, |n| d < n.distance_m) {
            nearest = Some(NearestWaypoint {
                name: wp.name.clone(),
                distance_m: d,
            });
        }
    }

    GeofenceResult::Outside { nearest }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::new("Casa", -23.555, -46.63, 30.0),
            Waypoint::new("Loja 733", -23.542, -46.619, 30.0),
            Waypoint::new("Faculdade", -23.561, -46.654, 40.0),
        ]
    }

    #[test]
    fn test_distance_zero_and_symmetric() {
        let points = [(0.0, 0.0), (-23.555, -46.63), (48.1173, 11.5167), (89.9, 179.9), (-45.0, -179.5)];
        for &(lat1, lon1) in &points {
            assert_eq!(distance_m(lat1, lon1, lat1, lon1), 0.0);
            for &(lat2, lon2) in &points {
                assert_eq!(
                    distance_m(lat1, lon1, lat2, lon2),
                    distance_m(lat2, lon2, lat1, lon1)
                );
            }
        }
    }

    #[test]
    fn test_distance_known_values() {
        // One degree of longitude on the equator
        let d = distance_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_194.93).abs() < 0.1, "got {}", d);

        // Antipodes are half the circumference apart
        let d = distance_m(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-6);
    }

    #[test]
    fn test_inside_at_center() {
        for radius in [0.001, 1.0, 30.0, 10_000.0] {
            let wps = vec![Waypoint::new("Home", 10.0, 20.0, radius)];
            assert_eq!(
                check_location(10.0, 20.0, &wps),
                GeofenceResult::Inside {
                    name: "Home".to_string(),
                    distance_m: 0.0
                }
            );
        }
    }

    #[test]
    fn test_outside_just_past_radius() {
        // 0.001 degrees of latitude is ~111 m
        let step = distance_m(0.0, 0.0, 0.001, 0.0);
        let wps = vec![
            Waypoint::new("North", 0.001, 0.0, step - 0.01),
            Waypoint::new("South", -0.001, 0.0, step - 0.01),
        ];

        match check_location(0.0, 0.0, &wps) {
            GeofenceResult::Outside { nearest: Some(n) } => {
                // equal distances: first waypoint wins
                assert_eq!(n.name, "North");
                assert_eq!(n.distance_m, step);
            }
            other => panic!("expected Outside, got {:?}", other),
        }
    }

    #[test]
    fn test_first_match_wins_over_nearest() {
        let wps = vec![
            Waypoint::new("Wide", 0.0, 0.001, 500.0),
            Waypoint::new("Exact", 0.0, 0.0, 10.0),
        ];
        assert_eq!(check_location(0.0, 0.0, &wps).place(), Some("Wide"));
    }

    #[test]
    fn test_nearest_reported_when_outside() {
        // About 550 m south of Casa, 2 km or more from the others
        let result = check_location(-23.56, -46.63, &sample_waypoints());
        match result {
            GeofenceResult::Outside { nearest: Some(n) } => assert_eq!(n.name, "Casa"),
            other => panic!("expected Outside, got {:?}", other),
        }

        let inside = check_location(-23.5551, -46.6301, &sample_waypoints());
        assert_eq!(inside.place(), Some("Casa"));
    }

    #[test]
    fn test_empty_waypoints() {
        assert_eq!(
            check_location(-23.555, -46.63, &[]),
            GeofenceResult::Outside { nearest: None }
        );
    }
}
