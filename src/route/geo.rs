//! Great-circle helpers on a spherical Earth.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Central angle to `other` in radians.
    fn angle_to(&self, other: &LatLng) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * a.sqrt().min(1.0).asin()
    }
}

/// Calculate horizontal distance between two GPS points (Haversine formula)
pub fn haversine_distance(from: &LatLng, to: &LatLng) -> f64 {
    EARTH_RADIUS_M * from.angle_to(to)
}

/// Initial heading from `from` to `to` in degrees, in (-180, 180].
pub fn initial_bearing(from: &LatLng, to: &LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    y.atan2(x).to_degrees()
}

/// Point a `fraction` of the way along the great circle from `from` to `to`.
pub fn interpolate(from: &LatLng, to: &LatLng, fraction: f64) -> LatLng {
    let angle = from.angle_to(to);
    if angle < 1e-6 {
        return LatLng::new(
            from.lat + (to.lat - from.lat) * fraction,
            from.lng + (to.lng - from.lng) * fraction,
        );
    }

    let (lat1, lng1) = (from.lat.to_radians(), from.lng.to_radians());
    let (lat2, lng2) = (to.lat.to_radians(), to.lng.to_radians());

    let a = ((1.0 - fraction) * angle).sin() / angle.sin();
    let b = (fraction * angle).sin() / angle.sin();

    let x = a * lat1.cos() * lng1.cos() + b * lat2.cos() * lng2.cos();
    let y = a * lat1.cos() * lng1.sin() + b * lat2.cos() * lng2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    LatLng::new(
        z.atan2((x * x + y * y).sqrt()).to_degrees(),
        y.atan2(x).to_degrees(),
    )
}

/// Grade in percent, 0 for segments too short to measure.
pub fn calculate_gradient(elevation_change: f64, horizontal_distance: f64) -> f64 {
    if horizontal_distance < 0.1 {
        return 0.0;
    }
    elevation_change / horizontal_distance * 100.0
}
