//! Unit tests for GPX import and route preparation.

use pedalsim::route::{parse_gpx, RouteBuilder, RouteError, TrackPoint};

const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <metadata>
    <name>Metadata Name</name>
  </metadata>
  <trk>
    <name>Track Name</name>
    <trkseg>
      <trkpt lat="45.5" lon="-122.5">
        <ele>100</ele>
      </trkpt>
      <trkpt lat="45.501" lon="-122.5">
        <ele>104</ele>
      </trkpt>
      <trkpt lat="45.502" lon="-122.5">
        <ele>110</ele>
      </trkpt>
      <trkpt lat="45.503" lon="-122.5">
        <ele>108</ele>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <rte>
    <name>Route Name</name>
    <rtept lat="45.5" lon="-122.5">
      <ele>100</ele>
    </rtept>
    <rtept lat="45.51" lon="-122.51">
      <ele>110</ele>
    </rtept>
  </rte>
</gpx>"#;

const WAYPOINTS_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <wpt lat="45.5" lon="-122.5">
    <name>Point 1</name>
  </wpt>
  <wpt lat="45.51" lon="-122.51">
    <ele>110</ele>
    <name>Point 2</name>
  </wpt>
</gpx>"#;

#[test]
fn test_parse_track() {
    let track = parse_gpx(TRACK_GPX.as_bytes()).unwrap();
    assert_eq!(track.name.as_deref(), Some("Track Name"));
    assert_eq!(track.points.len(), 4);
    assert!((track.points[0].location.lat - 45.5).abs() < 1e-9);
    assert!((track.points[0].location.lng + 122.5).abs() < 1e-9);
    assert_eq!(track.points[2].elevation, Some(110.0));
    assert_eq!(track.missing_elevation(), 0);
}

#[test]
fn test_parse_route_points() {
    let track = parse_gpx(ROUTE_GPX.as_bytes()).unwrap();
    assert_eq!(track.name.as_deref(), Some("Route Name"));
    assert_eq!(track.points.len(), 2);
}

#[test]
fn test_parse_waypoints_with_missing_elevation() {
    let track = parse_gpx(WAYPOINTS_GPX.as_bytes()).unwrap();
    assert_eq!(track.points.len(), 2);
    assert_eq!(track.missing_elevation(), 1);

    let points = track.into_track_points();
    assert_eq!(points[0].elevation, 0.0);
    assert_eq!(points[1].elevation, 110.0);
}

#[test]
fn test_invalid_gpx() {
    assert!(matches!(
        parse_gpx(b"not a gpx file"),
        Err(RouteError::Parse(_))
    ));
}

#[test]
fn test_built_route_ends_in_sentinel() {
    let track = parse_gpx(TRACK_GPX.as_bytes()).unwrap();
    let route = RouteBuilder::new("Track Name")
        .build(&track.into_track_points())
        .unwrap();

    assert_eq!(route.len(), 4);
    let last = route.points().last().unwrap();
    assert!(last.is_sentinel());
    assert_eq!(last.distance, 0.0);
    assert_eq!(last.elevation, 108.0);

    // Segments of about 111 m each
    assert!((route.total_distance() - 333.6).abs() < 1.0);
    assert!(route.points()[0].grade > 0.0);
    assert!(route.points()[2].opposite < 0.0);
}

#[test]
fn test_climb_only_counts_ascent() {
    let route = RouteBuilder::new("Hill")
        .build(&[
            TrackPoint::new(0.0, 0.0, 0.0),
            TrackPoint::new(0.0, 0.01, 50.0),
            TrackPoint::new(0.0, 0.02, 100.0),
            TrackPoint::new(0.0, 0.03, 150.0),
            TrackPoint::new(0.0, 0.04, 140.0),
        ])
        .unwrap();
    assert_eq!(route.points()[3].climb, 0.0);
    assert!((route.total_climb() - 150.0).abs() < 1e-9);
}

#[test]
fn test_single_point_is_too_few() {
    let result = RouteBuilder::new("Dot").build(&[TrackPoint::new(1.0, 1.0, 0.0)]);
    assert_eq!(result.unwrap_err(), RouteError::TooFewPoints(1));
}
