//! Route import and preprocessing.
//!
//! A GPX track becomes a [`Route`]: evenly spaced points carrying the
//! distance, heading, raw and smoothed grade, and counted climb of the
//! segment to the next point. The last point is a zero-length sentinel.

pub mod builder;
pub mod elevation;
pub mod geo;
pub mod gpx;
pub mod point;

use crate::metrics::SmoothingError;
use thiserror::Error;

pub use builder::{resample, RouteBuilder, TrackPoint};
pub use elevation::{plan_slices, sample_slices, ElevationService, PathSlice};
pub use geo::{haversine_distance, initial_bearing, interpolate, LatLng};
pub use gpx::{parse_gpx, GpsPoint, GpxTrack};
pub use point::{Route, RoutePoint};

/// Errors that can occur during route import
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("Route needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("Last route point must be a zero-length sentinel")]
    MissingSentinel,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Elevation fetch failed: {0}")]
    ElevationFetchFailed(String),

    #[error("Grade smoothing failed: {0}")]
    Smoothing(#[from] SmoothingError),
}
