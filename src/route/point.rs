//! Preprocessed route: points with per-segment geometry.

use super::geo::LatLng;
use super::RouteError;
use serde::{Deserialize, Serialize};

/// One point of a preprocessed route. Segment values describe the stretch
/// from this point to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutePoint {
    /// GPS location
    pub location: LatLng,
    /// Elevation in meters
    pub elevation: f64,
    /// Distance to the next point in meters
    pub distance: f64,
    /// Heading to the next point in degrees
    pub heading: f64,
    /// Raw grade in percent
    pub grade: f64,
    /// Kernel-smoothed grade in percent
    pub smoothed_grade: f64,
    /// Meters climbed to the next point, 0 on flats and descents
    pub climb: f64,
    /// Elevation change to the next point in meters
    pub opposite: f64,
}

impl RoutePoint {
    /// Final point of a route: no segment follows it.
    pub fn sentinel(location: LatLng, elevation: f64) -> Self {
        Self {
            location,
            elevation,
            ..Default::default()
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.distance == 0.0
            && self.grade == 0.0
            && self.heading == 0.0
            && self.opposite == 0.0
            && self.climb == 0.0
    }
}

/// A named, validated sequence of route points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    name: String,
    points: Vec<RoutePoint>,
}

impl Route {
    /// Validate and wrap preprocessed points.
    pub fn new(name: &str, points: Vec<RoutePoint>) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::TooFewPoints(points.len()));
        }
        if !points.last().is_some_and(RoutePoint::is_sentinel) {
            return Err(RouteError::MissingSentinel);
        }

        Ok(Self {
            name: name.to_string(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn point(&self, idx: usize) -> Option<&RoutePoint> {
        self.points.get(idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Route length in meters.
    pub fn total_distance(&self) -> f64 {
        self.points.iter().map(|p| p.distance).sum()
    }

    /// Sum of counted climbs in meters.
    pub fn total_climb(&self) -> f64 {
        self.points.iter().map(|p| p.climb).sum()
    }

    /// Distance from the start to `idx` plus `pct` of that point's segment.
    pub fn distance_at(&self, idx: usize, pct: f64) -> f64 {
        let before: f64 = self.points.iter().take(idx).map(|p| p.distance).sum();
        let within = self.points.get(idx).map_or(0.0, |p| p.distance * pct);
        before + within
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRoute {
            name: String,
            points: Vec<RoutePoint>,
        }

        let raw = RawRoute::deserialize(deserializer)?;
        Route::new(&raw.name, raw.points).map_err(serde::de::Error::custom)
    }
}
