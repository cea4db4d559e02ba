//! Physics engine for power-to-speed calculation
//!
//! Converts rider power into virtual road speed from rider/bike parameters,
//! road grade and air density at the rider's elevation.

pub mod air_density;
pub mod power_speed;

pub use air_density::{air_density, Atmosphere};
pub use power_speed::{forces, power_for_velocity, velocity_for_power, Forces, PowerSpeedParams};

use serde::{Deserialize, Serialize};

const KPH_TO_MPS: f64 = 1.0 / 3.6;

/// Rider and bike parameters that stay fixed for a ride.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderProfile {
    /// Rider mass in kilograms
    pub rider_mass_kg: f64,
    /// Bike mass in kilograms
    pub bike_mass_kg: f64,
    /// Frontal area in m²
    pub frontal_area_m2: f64,
    /// Drag coefficient (Cd)
    pub drag_coefficient: f64,
    /// Drivetrain loss percentage
    pub drivetrain_loss_percent: f64,
    /// Coefficient of rolling resistance
    pub rolling_resistance_coeff: f64,
}

impl RiderProfile {
    /// Model parameters for one road grade and air density.
    pub fn params(&self, grade_percent: f64, air_density: f64) -> PowerSpeedParams {
        PowerSpeedParams {
            rider_mass_kg: self.rider_mass_kg,
            bike_mass_kg: self.bike_mass_kg,
            frontal_area_m2: self.frontal_area_m2,
            drag_coefficient: self.drag_coefficient,
            drivetrain_loss_percent: self.drivetrain_loss_percent,
            rolling_resistance_coeff: self.rolling_resistance_coeff,
            grade_percent,
            air_density,
        }
    }
}

/// Physics engine for calculating virtual speed from power
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsEngine {
    pub rider: RiderProfile,
    pub atmosphere: Atmosphere,
}

impl PhysicsEngine {
    pub fn new(rider: RiderProfile, atmosphere: Atmosphere) -> Self {
        Self { rider, atmosphere }
    }

    /// Speed in m/s for the given power on a road of `grade_percent` at `elevation_m`.
    ///
    /// The result is unclamped and may be negative on climbs.
    pub fn speed_mps(&self, power_watts: f64, grade_percent: f64, elevation_m: f64) -> f64 {
        let rho = self.atmosphere.density_at(elevation_m);
        let params = self.rider.params(grade_percent, rho);
        velocity_for_power(power_watts, &params) * KPH_TO_MPS
    }

    /// Power in watts needed to hold `speed_mps` on the given road.
    pub fn power_for_speed(&self, speed_mps: f64, grade_percent: f64, elevation_m: f64) -> f64 {
        let rho = self.atmosphere.density_at(elevation_m);
        let params = self.rider.params(grade_percent, rho);
        power_for_velocity(speed_mps / KPH_TO_MPS, &params)
    }

    /// Update rider mass (e.g., from settings change)
    pub fn set_rider_mass(&mut self, mass_kg: f64) {
        self.rider.rider_mass_kg = mass_kg;
    }
}
