//! Riding state and per-tick history.

use crate::route::{LatLng, Route};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which map view the rider is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapMode {
    #[default]
    #[serde(rename = "SV")]
    StreetView,
    #[serde(rename = "MV")]
    MapView,
}

/// Simulation cursor and accumulated ride totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidingState {
    /// Index of the route point whose segment is being ridden
    pub point_idx: usize,
    /// Fraction of the current segment already covered, in [0, 1)
    pub point_pct: f64,
    /// Wall time of the previous tick
    pub last_sample_time: DateTime<Utc>,
    /// Interpolated position
    pub location: LatLng,
    /// Interpolated elevation in meters
    pub elevation: f64,
    /// Grade covered during the last tick, weighted by capacity used
    pub average_grade: f64,
    pub map_mode: MapMode,
    /// Effective power of the last tick in watts
    pub watts: f64,
    /// Latest cadence in RPM
    pub rpm: Option<f64>,
    /// Latest heart rate in BPM
    pub bpm: Option<f64>,
    /// Speed in m/s
    pub speed: f64,
    /// Cumulative distance in meters
    pub distance: f64,
    /// Cumulative counted climb in meters
    pub climb: f64,
    /// Seconds spent moving
    pub elapsed: f64,
    /// Set once the route's final point is reached
    pub complete: bool,
}

impl RidingState {
    /// State at the start of `route`.
    pub fn start(route: &Route, now: DateTime<Utc>) -> Self {
        let first = route.points()[0];
        Self {
            point_idx: 0,
            point_pct: 0.0,
            last_sample_time: now,
            location: first.location,
            elevation: first.elevation,
            average_grade: 0.0,
            map_mode: MapMode::default(),
            watts: 0.0,
            rpm: None,
            bpm: None,
            speed: 0.0,
            distance: 0.0,
            climb: 0.0,
            elapsed: 0.0,
            complete: false,
        }
    }

    /// Whether the cursor is a position on `route`: an unfinished ride sits
    /// on a segment before the sentinel with `point_pct` in [0, 1).
    pub fn is_on(&self, route: &Route) -> bool {
        self.complete
            || (self.point_idx + 1 < route.len() && (0.0..1.0).contains(&self.point_pct))
    }
}

/// One tick's record for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub time: DateTime<Utc>,
    pub location: LatLng,
    /// Power in watts
    pub power: f64,
    /// Elevation in meters
    pub elevation: f64,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
}
