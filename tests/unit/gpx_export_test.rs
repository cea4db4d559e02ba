//! Unit tests for GPX export of simulated rides.

use chrono::{TimeZone, Utc};
use pedalsim::physics::PhysicsEngine;
use pedalsim::recording::{export_gpx, export_gpx_to_file, ExportError};
use pedalsim::route::{RouteBuilder, TrackPoint};
use pedalsim::simulation::{RideSimulator, SimulationTunables};
use pedalsim::storage::AppConfig;
use std::sync::Arc;
use tempfile::TempDir;

fn ridden_simulator(ticks: i64) -> RideSimulator {
    let route = RouteBuilder::new("Export Loop")
        .build(&[
            TrackPoint::new(46.0, 8.0, 300.0),
            TrackPoint::new(46.0, 8.01, 310.0),
            TrackPoint::new(46.01, 8.01, 305.0),
        ])
        .unwrap();
    let physics: PhysicsEngine = AppConfig::default().physics();
    let start = Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap();
    let mut simulator =
        RideSimulator::new(Arc::new(route), physics, SimulationTunables::default(), start);
    for i in 1..=ticks {
        simulator.push_power(220.0);
        simulator.tick(start + chrono::Duration::seconds(i));
    }
    simulator
}

#[test]
fn test_one_trackpoint_per_tick() {
    let simulator = ridden_simulator(30);
    let xml = export_gpx("Export Loop", simulator.history()).unwrap();

    assert_eq!(simulator.history().len(), 30);
    assert_eq!(xml.matches("<trkpt ").count(), 30);
    assert_eq!(xml.matches("<power>220</power>").count(), 30);
    assert!(xml.contains("<time>2024-03-10T07:00:01Z</time>"));
    assert!(xml.contains("<time>2024-03-10T07:00:30Z</time>"));
}

#[test]
fn test_no_heart_rate_extension_without_readings() {
    let simulator = ridden_simulator(3);
    let xml = export_gpx("Export Loop", simulator.history()).unwrap();
    assert!(!xml.contains("gpxtpx:hr>"));
    assert!(!xml.contains("<gpxtpx:TrackPointExtension>"));
}

#[test]
fn test_export_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ride.gpx");
    let simulator = ridden_simulator(5);

    export_gpx_to_file("Export Loop", simulator.history(), &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("<name>Export Loop</name>"));
}

#[test]
fn test_nothing_to_export() {
    assert!(matches!(export_gpx("Empty", &[]), Err(ExportError::NoData)));
}
