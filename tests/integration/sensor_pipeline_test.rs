//! Integration tests from raw sensor frames to the ride session.

use chrono::{Duration as ChronoDuration, Utc};
use pedalsim::route::{LatLng, Route, RoutePoint};
use pedalsim::sensors::{
    BleHeartRateMeter, BlePowerCadenceMeter, ConnectionState, SensorError, SensorEvent,
    SensorManager, TelemetryBus, VirtualPowerMeter,
};
use pedalsim::simulation::RideSession;
use pedalsim::storage::{AppConfig, ProgressStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn route(length_m: f64) -> Arc<Route> {
    Arc::new(
        Route::new(
            "Pipeline",
            vec![
                RoutePoint {
                    location: LatLng::new(0.0, 0.0),
                    distance: length_m,
                    heading: 90.0,
                    ..Default::default()
                },
                RoutePoint::sentinel(LatLng::new(0.0, length_m / 111_195.0), 0.0),
            ],
        )
        .unwrap(),
    )
}

/// Cycling power frame with crank data.
fn power_frame(watts: i16, revolutions: u16, event_time: u16) -> Vec<u8> {
    let mut frame = vec![0x20, 0x00];
    frame.extend_from_slice(&watts.to_le_bytes());
    frame.extend_from_slice(&revolutions.to_le_bytes());
    frame.extend_from_slice(&event_time.to_le_bytes());
    frame
}

#[test]
fn test_ble_frames_reach_the_session() {
    let bus = TelemetryBus::new();
    let mut manager = SensorManager::new(bus.clone());
    manager
        .register(Box::new(BlePowerCadenceMeter::new("pm", "Crank PM")))
        .unwrap();
    manager
        .register(Box::new(BleHeartRateMeter::new("hrm", "Strap")))
        .unwrap();

    let start = Utc::now();
    let instant = Instant::now();
    let mut session = RideSession::new(route(1000.0), &AppConfig::default(), start);
    session.subscribe(&bus);

    manager.handle_frame("pm", &power_frame(180, 10, 1024), instant).unwrap();
    manager.handle_frame("pm", &power_frame(220, 12, 2560), instant).unwrap();
    manager.handle_frame("hrm", &[0x00, 0x8C], instant).unwrap();

    session.tick_at(start + ChronoDuration::seconds(1), instant);

    let state = session.state();
    assert_eq!(state.watts, 200.0);
    assert_eq!(state.bpm, Some(140.0));
    // Second crank reading: 2 revolutions in 1.5 s
    assert_eq!(state.rpm, Some(80.0));
    assert!(state.distance > 0.0);
}

#[test]
fn test_malformed_frame_is_reported() {
    let bus = TelemetryBus::new();
    let mut manager = SensorManager::new(bus);
    let events = manager.event_receiver();
    manager
        .register(Box::new(BlePowerCadenceMeter::new("pm", "Crank PM")))
        .unwrap();

    let result = manager.handle_frame("pm", &[0x20, 0x00, 0x10], Instant::now());
    assert!(matches!(result, Err(SensorError::MalformedFrame { .. })));
    assert!(events
        .try_iter()
        .any(|event| matches!(event, SensorEvent::Error(_))));
}

#[test]
fn test_disconnected_meter_is_ignored_until_reconnected() {
    let bus = TelemetryBus::new();
    let mut manager = SensorManager::new(bus);
    manager
        .register(Box::new(BlePowerCadenceMeter::new("pm", "Crank PM")))
        .unwrap();

    manager.mark_disconnected("pm").unwrap();
    assert_eq!(
        manager.connection_state("pm"),
        Some(ConnectionState::Disconnected)
    );
    assert!(matches!(
        manager.handle_frame("pm", &power_frame(200, 1, 1), Instant::now()),
        Err(SensorError::Disconnected(_))
    ));

    manager.mark_reconnecting("pm").unwrap();
    manager.mark_reconnected("pm").unwrap();
    assert_eq!(
        manager.handle_frame("pm", &power_frame(200, 1, 1), Instant::now()),
        Ok(2)
    );
}

#[test]
fn test_ant_bridge_messages_reach_the_session() {
    let bus = TelemetryBus::new();
    let mut manager = SensorManager::new(bus.clone());

    let start = Utc::now();
    let instant = Instant::now();
    let mut session = RideSession::new(route(1000.0), &AppConfig::default(), start);
    session.subscribe(&bus);

    let published = manager
        .handle_ant_message(
            r#"{"type":"bike_power","DeviceID":77,"ManId":1,"Power":240,"Cadence":92}"#,
            instant,
        )
        .unwrap();
    assert_eq!(published, 2);
    manager
        .handle_ant_message(r#"{"type":"hr","DeviceID":12,"ComputedHeartRate":151}"#, instant)
        .unwrap();

    session.tick_at(start + ChronoDuration::seconds(1), instant);
    let state = session.state();
    assert_eq!(state.watts, 240.0);
    assert_eq!(state.rpm, Some(92.0));
    assert_eq!(state.bpm, Some(151.0));
}

#[test]
fn test_stale_heart_rate_is_dropped() {
    let bus = TelemetryBus::new();
    let mut manager = SensorManager::new(bus.clone());
    manager
        .register(Box::new(BleHeartRateMeter::new("hrm", "Strap")))
        .unwrap();

    let start = Utc::now();
    let instant = Instant::now();
    let mut session = RideSession::new(route(1000.0), &AppConfig::default(), start);
    session.subscribe(&bus);

    manager.handle_frame("hrm", &[0x00, 0x78], instant).unwrap();
    session.tick_at(start + ChronoDuration::seconds(1), instant);
    assert_eq!(session.state().bpm, Some(120.0));

    session.tick_at(
        start + ChronoDuration::seconds(10),
        instant + Duration::from_secs(10),
    );
    assert_eq!(session.state().bpm, None);
}

#[tokio::test]
async fn test_run_finishes_and_clears_saved_progress() {
    let dir = TempDir::new().unwrap();
    let store = ProgressStore::open(dir.path(), 5).unwrap();

    let mut config = AppConfig::default();
    config.recording.autosave_interval_secs = 0;

    let bus = TelemetryBus::new();
    let mut session = RideSession::new(route(3.0), &config, Utc::now()).with_store(store.clone());
    session.subscribe(&bus);

    let meter = VirtualPowerMeter::new(400.0).with_interval(Duration::from_millis(10));
    let task = meter.spawn(bus);

    tokio::time::timeout(
        Duration::from_secs(20),
        session.run(Duration::from_millis(20)),
    )
    .await
    .expect("ride should finish")
    .unwrap();
    task.abort();

    assert!(session.is_complete());
    assert!((session.state().distance - 3.0).abs() < 1e-6);
    assert!(!session.history().is_empty());
    assert!(store.list().unwrap().is_empty());
}
