//! Elevation lookup along a track's path.
//!
//! The path is cut into slices of fewer than [`MAX_SLICE_POINTS`] points
//! covering at most `MAX_SLICE_POINTS * SAMPLE_SPACING_M` meters. Each slice
//! is sampled every [`SAMPLE_SPACING_M`] along the great circle and the
//! samples are looked up in one request. The samples replace the track.

use super::builder::{resample, TrackPoint};
use super::geo::{haversine_distance, LatLng};
use super::RouteError;
use std::time::Duration;

/// Distance between elevation samples in meters.
pub const SAMPLE_SPACING_M: f64 = 20.0;

/// Track points per lookup request.
pub const MAX_SLICE_POINTS: usize = 512;

const MAX_SLICE_DISTANCE_M: f64 = MAX_SLICE_POINTS as f64 * SAMPLE_SPACING_M;

pub const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

/// A run of consecutive track points looked up together.
///
/// `distance` includes the segment from the slice's last point to the first
/// point of the next slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSlice {
    pub start: usize,
    pub end: usize,
    pub distance: f64,
}

/// Cut `path` into lookup slices.
///
/// A slice always takes at least one point, so a single segment longer
/// than the distance limit becomes a slice of its own.
pub fn plan_slices(path: &[LatLng]) -> Vec<PathSlice> {
    let mut slices = Vec::new();
    let mut start = 0;

    while start < path.len() {
        let mut end = start;
        let mut distance = 0.0;

        while end < path.len() {
            let segment = path
                .get(end + 1)
                .map_or(0.0, |next| haversine_distance(&path[end], next));
            let taken = end - start + 1;
            if end > start
                && (distance + segment > MAX_SLICE_DISTANCE_M || taken >= MAX_SLICE_POINTS)
            {
                break;
            }
            distance += segment;
            end += 1;
        }

        slices.push(PathSlice {
            start,
            end,
            distance,
        });
        start = end;
    }

    slices
}

/// Sample locations for each slice, every [`SAMPLE_SPACING_M`] or closer.
///
/// A slice's samples stop short of the next slice's first point, which that
/// slice samples itself. Only the last slice includes its end point.
pub fn sample_slices(path: &[LatLng], slices: &[PathSlice]) -> Vec<Vec<LatLng>> {
    slices
        .iter()
        .map(|slice| {
            let last_slice = slice.end >= path.len();
            let through = if last_slice { path.len() } else { slice.end + 1 };
            let track: Vec<TrackPoint> = path[slice.start..through]
                .iter()
                .map(|&location| TrackPoint {
                    location,
                    elevation: 0.0,
                })
                .collect();

            let mut samples: Vec<LatLng> = resample(&track, SAMPLE_SPACING_M)
                .into_iter()
                .map(|p| p.location)
                .collect();
            if !last_slice && samples.len() > 1 {
                samples.pop();
            }
            samples
        })
        .collect()
}

/// Client for an open-elevation compatible lookup API.
pub struct ElevationService {
    client: reqwest::Client,
    lookup_url: String,
    slice_pause: Duration,
}

impl ElevationService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            lookup_url: OPEN_ELEVATION_URL.to_string(),
            slice_pause: Duration::from_secs(4),
        }
    }

    /// Use a self-hosted lookup endpoint.
    pub fn with_lookup_url(mut self, url: &str) -> Self {
        self.lookup_url = url.to_string();
        self
    }

    /// Wait between consecutive slice requests.
    pub fn with_slice_pause(mut self, pause: Duration) -> Self {
        self.slice_pause = pause;
        self
    }

    /// Evenly spaced track points with looked-up elevations along `path`.
    pub async fn sample_track(&self, path: &[LatLng]) -> Result<Vec<TrackPoint>, RouteError> {
        let slices = plan_slices(path);
        let mut track = Vec::new();

        for (i, locations) in sample_slices(path, &slices).into_iter().enumerate() {
            if i > 0 && !self.slice_pause.is_zero() {
                tokio::time::sleep(self.slice_pause).await;
            }

            let elevations = self.lookup(&locations).await?;
            tracing::debug!(
                "Slice {}/{}: {} elevation samples",
                i + 1,
                slices.len(),
                elevations.len()
            );
            track.extend(
                locations
                    .into_iter()
                    .zip(elevations)
                    .map(|(location, elevation)| TrackPoint {
                        location,
                        elevation,
                    }),
            );
        }

        Ok(track)
    }

    async fn lookup(&self, locations: &[LatLng]) -> Result<Vec<f64>, RouteError> {
        let failed = |e: reqwest::Error| RouteError::ElevationFetchFailed(e.to_string());
        let request = LookupRequest {
            locations: locations
                .iter()
                .map(|l| LookupLocation {
                    latitude: l.lat,
                    longitude: l.lng,
                })
                .collect(),
        };

        let response: LookupResponse = self
            .client
            .post(&self.lookup_url)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)?;

        response.elevations(locations.len())
    }
}

impl Default for ElevationService {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, serde::Serialize)]
struct LookupLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, serde::Serialize)]
struct LookupRequest {
    locations: Vec<LookupLocation>,
}

#[derive(Debug, serde::Deserialize)]
struct LookupResult {
    elevation: f64,
}

#[derive(Debug, serde::Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

impl LookupResponse {
    fn elevations(self, expected: usize) -> Result<Vec<f64>, RouteError> {
        if self.results.len() != expected {
            return Err(RouteError::ElevationFetchFailed(format!(
                "asked for {} elevations, got {}",
                expected,
                self.results.len()
            )));
        }
        Ok(self.results.into_iter().map(|r| r.elevation).collect())
    }
}
