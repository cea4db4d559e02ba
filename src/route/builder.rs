//! Route preprocessing: raw track points to simulator-ready route points.

use super::geo::{calculate_gradient, haversine_distance, initial_bearing, interpolate, LatLng};
use super::point::{Route, RoutePoint};
use super::RouteError;
use crate::metrics::{Kernel, KernelSmoother};
use serde::{Deserialize, Serialize};

/// Default grade smoothing bandwidth in point indices.
pub const DEFAULT_GRADE_BANDWIDTH: f64 = 2.0;

/// Smoothed grade (percent) below which a segment's climb is not counted.
pub const DEFAULT_CLIMB_GRADE_THRESHOLD: f64 = 0.95;

/// Raw track point with a known elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub location: LatLng,
    pub elevation: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64, elevation: f64) -> Self {
        Self {
            location: LatLng::new(lat, lng),
            elevation,
        }
    }
}

/// Builds a [`Route`] from a track.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    name: String,
    resample_spacing_m: Option<f64>,
    grade_bandwidth: f64,
    climb_grade_threshold: f64,
}

impl RouteBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resample_spacing_m: None,
            grade_bandwidth: DEFAULT_GRADE_BANDWIDTH,
            climb_grade_threshold: DEFAULT_CLIMB_GRADE_THRESHOLD,
        }
    }

    /// Resample the track to evenly spaced points before computing grades.
    pub fn resample_spacing(mut self, spacing_m: f64) -> Self {
        self.resample_spacing_m = Some(spacing_m);
        self
    }

    pub fn grade_bandwidth(mut self, bandwidth: f64) -> Self {
        self.grade_bandwidth = bandwidth;
        self
    }

    pub fn climb_grade_threshold(mut self, threshold: f64) -> Self {
        self.climb_grade_threshold = threshold;
        self
    }

    pub fn build(&self, track: &[TrackPoint]) -> Result<Route, RouteError> {
        if track.len() < 2 {
            return Err(RouteError::TooFewPoints(track.len()));
        }

        let track = match self.resample_spacing_m {
            Some(spacing) if spacing > 0.0 => resample(track, spacing),
            _ => track.to_vec(),
        };

        let mut points: Vec<RoutePoint> = track
            .windows(2)
            .map(|pair| {
                let (p1, p2) = (&pair[0], &pair[1]);
                let distance = haversine_distance(&p1.location, &p2.location);
                let opposite = p2.elevation - p1.elevation;
                RoutePoint {
                    location: p1.location,
                    elevation: p1.elevation,
                    distance,
                    heading: initial_bearing(&p1.location, &p2.location),
                    grade: calculate_gradient(opposite, distance),
                    smoothed_grade: 0.0,
                    climb: opposite,
                    opposite,
                }
            })
            .collect();

        if let Some(last) = track.last() {
            points.push(RoutePoint::sentinel(last.location, last.elevation));
        }

        let grades: Vec<f64> = points.iter().map(|p| p.grade).collect();
        let smoothed = KernelSmoother::new(Kernel::Gaussian, self.grade_bandwidth)
            .smooth_series(&grades)?;

        for (point, grade) in points.iter_mut().zip(smoothed) {
            point.smoothed_grade = grade;
            if point.smoothed_grade < self.climb_grade_threshold || point.climb < 0.0 {
                point.climb = 0.0;
            }
        }

        let route = Route::new(&self.name, points)?;
        tracing::info!(
            "Preprocessed route '{}': {} points, {:.1} km, {:.0} m climbing",
            route.name(),
            route.len(),
            route.total_distance() / 1000.0,
            route.total_climb()
        );
        Ok(route)
    }
}

/// Evenly spaced samples along the track, endpoints included.
///
/// Locations follow the great circle of each original segment; elevation is
/// interpolated linearly.
pub fn resample(track: &[TrackPoint], spacing_m: f64) -> Vec<TrackPoint> {
    let mut cumulative = Vec::with_capacity(track.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in track.windows(2) {
        total += haversine_distance(&pair[0].location, &pair[1].location);
        cumulative.push(total);
    }

    if total <= 0.0 || track.len() < 2 {
        return track.to_vec();
    }

    let samples = (total / spacing_m).ceil().max(1.0) as usize;
    let mut output = Vec::with_capacity(samples + 1);
    let mut segment = 0;

    for i in 0..=samples {
        let target = total * i as f64 / samples as f64;
        while segment + 2 < track.len() && cumulative[segment + 1] < target {
            segment += 1;
        }

        let (p1, p2) = (&track[segment], &track[segment + 1]);
        let length = cumulative[segment + 1] - cumulative[segment];
        let fraction = if length > 0.0 {
            ((target - cumulative[segment]) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };

        output.push(TrackPoint {
            location: interpolate(&p1.location, &p2.location, fraction),
            elevation: p1.elevation + (p2.elevation - p1.elevation) * fraction,
        });
    }

    output
}
