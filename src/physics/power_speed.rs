//! Cycling power versus velocity.
//!
//! Required power is the sum of gravity, rolling resistance and aerodynamic
//! drag times velocity, grossed up for drivetrain loss. The inverse relation
//! has no closed form, so velocity is found by bisection.

use serde::{Deserialize, Serialize};

/// Standard gravity used by the force model, m/s²
const GRAVITY: f64 = 9.8067;

/// Bisection search bounds in km/h
const VELOCITY_SEARCH_MIN_KPH: f64 = -1000.0;
const VELOCITY_SEARCH_MAX_KPH: f64 = 1000.0;

/// Stop once the computed power is this close to the target
const POWER_TOLERANCE_W: f64 = 1e-6;

const MAX_ITERATIONS: u32 = 100;

/// Parameters of the power model. All values are metric and required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSpeedParams {
    /// Rider mass in kilograms
    pub rider_mass_kg: f64,
    /// Bike mass in kilograms
    pub bike_mass_kg: f64,
    /// Frontal area in m²
    pub frontal_area_m2: f64,
    /// Drag coefficient (Cd)
    pub drag_coefficient: f64,
    /// Drivetrain loss as a percentage of leg power
    pub drivetrain_loss_percent: f64,
    /// Coefficient of rolling resistance (Crr)
    pub rolling_resistance_coeff: f64,
    /// Road grade as a percentage
    pub grade_percent: f64,
    /// Air density in kg/m³
    pub air_density: f64,
}

/// Resistive force components at a given velocity, in newtons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    pub gravity: f64,
    pub rolling: f64,
    pub drag: f64,
}

impl Forces {
    pub fn total(&self) -> f64 {
        self.gravity + self.rolling + self.drag
    }
}

fn kph_to_mps(velocity_kph: f64) -> f64 {
    velocity_kph * 1000.0 / 3600.0
}

/// Force components needed to hold `velocity_kph` under `params`.
pub fn forces(velocity_kph: f64, params: &PowerSpeedParams) -> Forces {
    let mass = params.rider_mass_kg + params.bike_mass_kg;
    let angle = (params.grade_percent / 100.0).atan();
    let v = kph_to_mps(velocity_kph);

    Forces {
        gravity: GRAVITY * mass * angle.sin(),
        rolling: GRAVITY * mass * angle.cos() * params.rolling_resistance_coeff,
        drag: 0.5 * params.frontal_area_m2 * params.drag_coefficient * params.air_density * v * v,
    }
}

/// Leg power in watts required to ride at `velocity_kph`.
pub fn power_for_velocity(velocity_kph: f64, params: &PowerSpeedParams) -> f64 {
    let wheel_power = forces(velocity_kph, params).total() * kph_to_mps(velocity_kph);
    wheel_power / (1.0 - params.drivetrain_loss_percent / 100.0)
}

/// Velocity in km/h reached with `power_watts` of leg power.
///
/// Always returns after at most 100 halvings of the search interval, even
/// if the tolerance was not reached. No floor is applied: with little power
/// on a climb the result is zero or negative.
pub fn velocity_for_power(power_watts: f64, params: &PowerSpeedParams) -> f64 {
    let mut lower = VELOCITY_SEARCH_MIN_KPH;
    let mut upper = VELOCITY_SEARCH_MAX_KPH;
    let mut mid = 0.0;
    let mut mid_power = power_for_velocity(mid, params);

    for _ in 0..=MAX_ITERATIONS {
        if (mid_power - power_watts).abs() < POWER_TOLERANCE_W {
            break;
        }

        if mid_power > power_watts {
            upper = mid;
        } else {
            lower = mid;
        }

        mid = (upper + lower) / 2.0;
        mid_power = power_for_velocity(mid, params);
    }

    mid
}
