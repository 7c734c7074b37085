//! Great-circle distance.

use hive_events::GeoPoint;

/// Equatorial earth radius in kilometres (WGS-84).
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Distance between two points, in kilometres.
///
/// Scoring and ETA estimation take this as an injected dependency so tests
/// and simulations can substitute a fixed table.
pub trait DistanceModel: Send + Sync {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64;
}

/// Haversine distance over a spherical earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl DistanceModel for GreatCircle {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        haversine_km(from, to)
    }
}

/// Calculate great-circle distance between two points (Haversine formula).
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Clamp guards asin against a marginally > 1 argument from rounding.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
