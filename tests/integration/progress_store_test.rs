//! Integration tests for saving and resuming rides.

use chrono::{Duration, TimeZone, Utc};
use pedalsim::route::{RouteBuilder, TrackPoint};
use pedalsim::simulation::{RideSession, RideSnapshot};
use pedalsim::storage::{AppConfig, ProgressError, ProgressStore, Units};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

fn ridden_session(ticks: i64) -> RideSession {
    let route = RouteBuilder::new("Lakeside")
        .build(&[
            TrackPoint::new(47.0, 8.0, 430.0),
            TrackPoint::new(47.0, 8.005, 436.0),
            TrackPoint::new(47.004, 8.005, 441.0),
        ])
        .unwrap();
    let start = Utc.with_ymd_and_hms(2024, 9, 1, 18, 0, 0).unwrap();
    let mut session = RideSession::new(Arc::new(route), &AppConfig::default(), start);
    for i in 1..=ticks {
        session.simulator_mut().push_power(230.0);
        session.tick_at(start + Duration::seconds(i), Instant::now());
    }
    session
}

#[test]
fn test_save_and_load_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open(dir.path(), 5).unwrap();
    let session = ridden_session(20);

    let snapshot = session.snapshot();
    let key = store.save(&snapshot).unwrap();
    assert_eq!(key, session.id().to_string());

    let loaded = store.load(&key).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(store.list().unwrap(), vec![key]);
}

#[test]
fn test_resumed_ride_continues_where_it_stopped() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open(dir.path(), 5).unwrap();
    let session = ridden_session(30);
    let key = store.save(&session.snapshot()).unwrap();

    let resume_at = Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap();
    let mut config = AppConfig::default();
    config.units = Units::Imperial;
    let mut resumed =
        RideSession::from_snapshot(store.load(&key).unwrap(), &config, resume_at).unwrap();

    assert_eq!(resumed.state().distance, session.state().distance);
    assert_eq!(resumed.state().point_idx, session.state().point_idx);
    assert_eq!(resumed.history(), session.history());
    // Units travel with the ride, not the current config
    assert_eq!(resumed.units(), Units::Metric);

    // The overnight pause is not ridden
    resumed.simulator_mut().push_power(230.0);
    resumed.tick_at(resume_at + Duration::seconds(1), Instant::now());
    let gained = resumed.state().distance - session.state().distance;
    assert!(gained > 0.0 && gained < 20.0, "Gained {} m", gained);
    assert_eq!(resumed.history().len(), 31);
}

#[test]
fn test_oldest_rides_are_evicted() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open(dir.path(), 2).unwrap();

    let keys: Vec<String> = (0..3)
        .map(|_| store.save(&ridden_session(2).snapshot()).unwrap())
        .collect();

    assert_eq!(store.list().unwrap(), vec![keys[2].clone(), keys[1].clone()]);
    assert!(matches!(
        store.load(&keys[0]),
        Err(ProgressError::NotFound(_))
    ));
    assert!(!dir.path().join(format!("{}.json", keys[0])).exists());
}

#[test]
fn test_touch_and_remove() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open(dir.path(), 5).unwrap();
    let first = store.save(&ridden_session(1).snapshot()).unwrap();
    let second = store.save(&ridden_session(1).snapshot()).unwrap();

    store.touch(&first).unwrap();
    assert_eq!(store.list().unwrap(), vec![first.clone(), second.clone()]);

    store.remove(&first).unwrap();
    assert_eq!(store.list().unwrap(), vec![second]);
    assert!(store.touch(&first).is_err());
}

#[test]
fn test_snapshot_json_is_self_contained() {
    let snapshot = ridden_session(5).snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let parsed: RideSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.route_name, "Lakeside");
    assert_eq!(parsed.route_points.len(), 3);
    assert!(parsed.route_points.last().unwrap().is_sentinel());
    assert_eq!(parsed.rider_mass_kg, 75.0);
}
