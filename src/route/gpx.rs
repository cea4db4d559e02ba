//! GPX file parser for route import.

use super::builder::TrackPoint;
use super::geo::LatLng;
use super::RouteError;

/// Raw GPS point from a GPX file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub location: LatLng,
    pub elevation: Option<f64>,
}

/// Points and name read from a GPX file
#[derive(Debug, Clone, PartialEq)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub points: Vec<GpsPoint>,
}

impl GpxTrack {
    pub fn missing_elevation(&self) -> usize {
        self.points.iter().filter(|p| p.elevation.is_none()).count()
    }

    /// Track points, with missing elevations defaulted to 0 m.
    pub fn into_track_points(self) -> Vec<TrackPoint> {
        let missing = self.missing_elevation();
        if missing > 0 {
            tracing::warn!("{} points have no elevation, using 0 m", missing);
        }

        self.points
            .into_iter()
            .map(|p| TrackPoint {
                location: p.location,
                elevation: p.elevation.unwrap_or(0.0),
            })
            .collect()
    }
}

fn to_gps_point(point: &gpx::Waypoint) -> GpsPoint {
    GpsPoint {
        location: LatLng::new(point.point().y(), point.point().x()),
        elevation: point.elevation,
    }
}

/// Parse GPX file content: track points, else route points, else waypoints
pub fn parse_gpx(content: &[u8]) -> Result<GpxTrack, RouteError> {
    let gpx_data: gpx::Gpx =
        gpx::read(content).map_err(|e| RouteError::Parse(format!("GPX parse error: {}", e)))?;

    let mut points: Vec<GpsPoint> = gpx_data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(to_gps_point)
        .collect();

    // If no tracks, try routes
    if points.is_empty() {
        points = gpx_data
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .map(to_gps_point)
            .collect();
    }

    // If still empty, try waypoints
    if points.is_empty() {
        points = gpx_data.waypoints.iter().map(to_gps_point).collect();
    }

    if points.is_empty() {
        return Err(RouteError::Parse(
            "No GPS points found in GPX file".to_string(),
        ));
    }

    let name = gpx_data
        .tracks
        .iter()
        .find_map(|track| track.name.clone())
        .or_else(|| gpx_data.routes.iter().find_map(|route| route.name.clone()))
        .or_else(|| gpx_data.metadata.as_ref().and_then(|m| m.name.clone()));

    tracing::debug!("Parsed {} GPX points", points.len());
    Ok(GpxTrack { name, points })
}
