//! Unit tests for air density and the power/speed model.

use pedalsim::physics::{
    air_density, power_for_velocity, velocity_for_power, Atmosphere, PhysicsEngine,
    PowerSpeedParams, RiderProfile,
};

fn params(grade_percent: f64, air_density: f64) -> PowerSpeedParams {
    PowerSpeedParams {
        rider_mass_kg: 75.0,
        bike_mass_kg: 8.0,
        frontal_area_m2: 0.65,
        drag_coefficient: 0.63,
        drivetrain_loss_percent: 4.0,
        rolling_resistance_coeff: 0.005,
        grade_percent,
        air_density,
    }
}

#[test]
fn test_air_density_plausible_range() {
    for temperature in [-10.0, 0.0, 15.0, 30.0, 40.0] {
        for pressure in [800.0, 950.0, 1013.25, 1050.0] {
            let rho = air_density(temperature, pressure, temperature - 10.0);
            assert!(rho > 0.8 && rho < 1.5, "{} at {} °C, {} mbar", rho, temperature, pressure);
        }
    }
}

#[test]
fn test_default_atmosphere_density() {
    let rho = Atmosphere::default().density_at(0.0);
    assert!((rho - 1.1682).abs() < 1e-3, "Density was {}", rho);
}

#[test]
fn test_density_falls_with_temperature() {
    let mut last = f64::MAX;
    for temperature in [-5.0, 5.0, 15.0, 25.0, 35.0] {
        let rho = air_density(temperature, 1000.0, -10.0);
        assert!(rho < last);
        last = rho;
    }
}

#[test]
fn test_density_rises_with_pressure() {
    assert!(air_density(20.0, 1020.0, 10.0) > air_density(20.0, 980.0, 10.0));
}

#[test]
fn test_humid_air_is_lighter() {
    assert!(air_density(25.0, 1000.0, 20.0) < air_density(25.0, 1000.0, 0.0));
}

#[test]
fn test_density_falls_with_elevation() {
    let atmosphere = Atmosphere::default();
    assert!(atmosphere.density_at(2000.0) < atmosphere.density_at(0.0));
}

#[test]
fn test_velocity_round_trip_on_flat_and_climbs() {
    for grade in [0.0, 2.0, 5.0, 10.0] {
        let p = params(grade, 1.2);
        for kph in [5.0, 15.0, 30.0, 45.0, 60.0] {
            let watts = power_for_velocity(kph, &p);
            let back = velocity_for_power(watts, &p);
            assert!((back - kph).abs() < 1e-3, "{} kph at {}% came back as {}", kph, grade, back);
        }
    }
}

#[test]
fn test_velocity_round_trip_fast_descents() {
    for grade in [-20.0, -10.0, -5.0] {
        let p = params(grade, 1.2);
        for kph in [100.0, 120.0] {
            let back = velocity_for_power(power_for_velocity(kph, &p), &p);
            assert!((back - kph).abs() < 1e-3, "{} kph at {}% came back as {}", kph, grade, back);
        }
    }
}

#[test]
fn test_power_round_trip_on_descents() {
    // Power is not monotonic in velocity downhill, but the solved velocity
    // still reproduces the requested power.
    for grade in [-20.0, -10.0, -5.0] {
        let p = params(grade, 1.2);
        for watts in [0.0, 100.0, 250.0, 400.0] {
            let kph = velocity_for_power(watts, &p);
            assert!((power_for_velocity(kph, &p) - watts).abs() < 1e-3);
        }
    }
}

#[test]
fn test_power_round_trip_across_grades() {
    for grade in (-20..=20).map(|g| g as f64) {
        let p = params(grade, 1.2);
        for watts in (0..=2000).step_by(25).map(|w| w as f64) {
            let kph = velocity_for_power(watts, &p);
            let error = (power_for_velocity(kph, &p) - watts).abs();
            assert!(error < 1e-5, "{} W at {}% came back {} W off", watts, grade, error);
        }
    }
}

#[test]
fn test_no_power_on_a_climb_does_not_move_forward() {
    for grade in [1.0, 5.0, 12.0] {
        assert!(velocity_for_power(0.0, &params(grade, 1.2)) <= 0.0);
    }
}

#[test]
fn test_more_power_is_faster() {
    let p = params(3.0, 1.2);
    assert!(velocity_for_power(300.0, &p) > velocity_for_power(200.0, &p));
}

#[test]
fn test_engine_power_for_five_mps() {
    let engine = PhysicsEngine::new(
        RiderProfile {
            rider_mass_kg: 75.0,
            bike_mass_kg: 8.0,
            frontal_area_m2: 0.65,
            drag_coefficient: 0.63,
            drivetrain_loss_percent: 4.0,
            rolling_resistance_coeff: 0.005,
        },
        Atmosphere::default(),
    );
    let watts = engine.power_for_speed(5.0, 0.0, 0.0);
    assert!((watts - 52.34).abs() < 0.05, "Power was {}", watts);
}
