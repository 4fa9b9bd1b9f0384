//! Geofence containment and location plausibility.

use serde::{Deserialize, Serialize};

use crate::config::GeoPolicy;
use crate::types::{Coordinate, Geofence};

/// Result of the location factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCheck {
    /// Distance from the geofence center is at most its radius.
    pub within_geofence: bool,
    /// Great-circle distance from the geofence center, meters.
    pub distance_m: f64,
    /// Accuracy reported by the client, meters.
    pub accuracy_m: f64,
    /// Coordinate trips at least one mock-location heuristic.
    pub is_mock_location: bool,
}

/// Great-circle distance between two points (haversine).
#[must_use]
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64, earth_radius_m: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    earth_radius_m * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// True when `distance_m` falls strictly inside `radius ± fraction·radius`.
#[must_use]
pub fn in_boundary_band(distance_m: f64, radius_m: f64, fraction: f64) -> bool {
    let lower = radius_m * (1.0 - fraction);
    let upper = radius_m * (1.0 + fraction);
    distance_m > lower && distance_m < upper
}

/// Stateless geofence verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoVerifier {
    policy: GeoPolicy,
}

impl GeoVerifier {
    /// Create a verifier with the given policy.
    pub fn new(policy: GeoPolicy) -> Self {
        Self { policy }
    }

    /// Distance from the geofence center.
    pub fn distance_to(&self, location: &Coordinate, geofence: &Geofence) -> f64 {
        haversine_distance(
            location.latitude,
            location.longitude,
            geofence.latitude,
            geofence.longitude,
            self.policy.earth_radius_m,
        )
    }

    /// Heuristic spoofing check.
    ///
    /// Flags integer-valued coordinates (typical of hand-entered mock
    /// positions), sub-meter accuracy (not achievable by consumer GNSS) and
    /// accuracy too coarse to place the client anywhere useful.
    pub fn is_mock_location(&self, location: &Coordinate) -> bool {
        let round_coords = location.latitude == location.latitude.round()
            && location.longitude == location.longitude.round();
        let too_precise = location.accuracy_m < self.policy.min_plausible_accuracy_m;
        let too_coarse = location.accuracy_m > self.policy.max_plausible_accuracy_m;

        round_coords || too_precise || too_coarse
    }

    /// Evaluate the location factor.
    pub fn check(&self, location: &Coordinate, geofence: &Geofence) -> GeoCheck {
        let distance_m = self.distance_to(location, geofence);
        GeoCheck {
            within_geofence: distance_m <= geofence.radius_m,
            distance_m,
            accuracy_m: location.accuracy_m,
            is_mock_location: self.is_mock_location(location),
        }
    }
}
