//! Integration tests for riding a prepared route.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pedalsim::route::{LatLng, Route, RouteBuilder, RoutePoint, TrackPoint};
use pedalsim::simulation::{RideSimulator, SimulationTunables, TickOutcome};
use pedalsim::storage::AppConfig;
use std::sync::Arc;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap()
}

/// One flat 1000 m segment followed by the sentinel.
fn kilometer() -> Arc<Route> {
    Arc::new(
        Route::new(
            "Kilometer",
            vec![
                RoutePoint {
                    location: LatLng::new(0.0, 0.0),
                    distance: 1000.0,
                    heading: 90.0,
                    ..Default::default()
                },
                RoutePoint::sentinel(LatLng::new(0.0, 0.008993), 0.0),
            ],
        )
        .unwrap(),
    )
}

fn simulator(route: Arc<Route>) -> RideSimulator {
    RideSimulator::new(
        route,
        AppConfig::default().physics(),
        SimulationTunables::default(),
        start(),
    )
}

/// Tick once a second at constant power until the ride ends.
fn ride_to_end(simulator: &mut RideSimulator, watts: f64, max_ticks: i64) -> i64 {
    for i in 1..=max_ticks {
        simulator.push_power(watts);
        if simulator.tick(start() + Duration::seconds(i)) == TickOutcome::Completed {
            return i;
        }
    }
    panic!("ride did not finish in {} ticks", max_ticks);
}

#[test]
fn test_two_point_ride_covers_the_route() {
    let mut simulator = simulator(kilometer());
    let ticks = ride_to_end(&mut simulator, 200.0, 1000);

    let state = simulator.state();
    assert!(state.complete);
    assert!((state.distance - 1000.0).abs() < 1e-6, "Distance was {}", state.distance);
    assert!((115..=125).contains(&ticks), "Took {} ticks", ticks);
    assert!((state.elapsed - ticks as f64).abs() < 1e-9);
    assert_eq!(simulator.history().len(), ticks as usize);
    assert_eq!(state.point_idx, 2);
}

#[test]
fn test_steady_five_mps_ride() {
    let physics = AppConfig::default().physics();
    let watts = physics.power_for_speed(5.0, 0.0, 0.0);

    let mut simulator = simulator(kilometer());
    let ticks = ride_to_end(&mut simulator, watts, 1000);

    let state = simulator.state();
    assert!((state.distance - 1000.0).abs() < 1e-6, "Distance was {}", state.distance);
    assert!((state.elapsed - 200.0).abs() < 10.0, "Elapsed was {}", state.elapsed);
    assert_eq!(state.elapsed, ticks as f64);
}

#[test]
fn test_completed_ride_is_frozen() {
    let mut simulator = simulator(kilometer());
    let ticks = ride_to_end(&mut simulator, 300.0, 1000);

    let state = simulator.state().clone();
    let history = simulator.history().len();

    simulator.push_power(500.0);
    let outcome = simulator.tick(start() + Duration::seconds(ticks + 10));
    assert_eq!(outcome, TickOutcome::AlreadyComplete);
    assert_eq!(simulator.state(), &state);
    assert_eq!(simulator.history().len(), history);
}

#[test]
fn test_no_power_stays_put() {
    let mut simulator = simulator(kilometer());
    for i in 1..=20 {
        simulator.tick(start() + Duration::seconds(i));
    }
    let state = simulator.state();
    assert_eq!(state.distance, 0.0);
    assert_eq!(state.elapsed, 0.0);
    assert_eq!(state.point_idx, 0);
    assert_eq!(simulator.history().len(), 20);
}

#[test]
fn test_distance_never_decreases() {
    let route = RouteBuilder::new("Rollers")
        .build(&[
            TrackPoint::new(0.0, 0.0, 0.0),
            TrackPoint::new(0.0, 0.003, 20.0),
            TrackPoint::new(0.0, 0.006, 0.0),
            TrackPoint::new(0.0, 0.009, 25.0),
        ])
        .unwrap();
    let mut simulator = simulator(Arc::new(route));

    let mut last = 0.0;
    for i in 1..=120 {
        simulator.push_power(if i % 20 < 10 { 250.0 } else { 20.0 });
        simulator.tick(start() + Duration::seconds(i));
        let distance = simulator.state().distance;
        assert!(distance >= last);
        assert!(simulator.state().point_pct < 1.0);
        last = distance;
    }
}

#[test]
fn test_climbing_is_slower_than_flat() {
    let flat = RouteBuilder::new("Flat")
        .build(&[TrackPoint::new(0.0, 0.0, 0.0), TrackPoint::new(0.0, 0.02, 0.0)])
        .unwrap();
    let climb = RouteBuilder::new("Climb")
        .build(&[
            TrackPoint::new(0.0, 0.0, 0.0),
            TrackPoint::new(0.0, 0.02, 150.0),
        ])
        .unwrap();

    let mut on_flat = simulator(Arc::new(flat));
    let mut on_climb = simulator(Arc::new(climb));
    for i in 1..=60 {
        on_flat.push_power(220.0);
        on_climb.push_power(220.0);
        on_flat.tick(start() + Duration::seconds(i));
        on_climb.tick(start() + Duration::seconds(i));
    }

    assert!(on_climb.state().distance < on_flat.state().distance);
    assert!(on_climb.state().elevation > 0.0);
}

#[test]
fn test_zero_length_segment_is_passed() {
    let route = Arc::new(
        Route::new(
            "Stutter",
            vec![
                RoutePoint {
                    location: LatLng::new(0.0, 0.0),
                    distance: 0.0,
                    ..Default::default()
                },
                RoutePoint {
                    location: LatLng::new(0.0, 0.0),
                    distance: 50.0,
                    heading: 90.0,
                    ..Default::default()
                },
                RoutePoint::sentinel(LatLng::new(0.0, 0.00045), 0.0),
            ],
        )
        .unwrap(),
    );
    let mut simulator = simulator(route);
    simulator.push_power(250.0);
    simulator.tick(start() + Duration::seconds(1));

    assert_eq!(simulator.state().point_idx, 1);
    assert!(simulator.state().distance > 0.0);
}
