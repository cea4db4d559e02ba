//! Air density from temperature, barometric pressure and dew point.
//!
//! Saturation vapor pressure uses Herman Wobus' polynomial approximation,
//! then density follows from the ideal-gas mixture of dry air and water vapor.

use serde::{Deserialize, Serialize};

/// Wobus polynomial coefficients, lowest order first.
const WOBUS: [f64; 10] = [
    0.99999683,
    -0.90826951e-2,
    0.78736169e-4,
    -0.61117958e-6,
    0.43884187e-8,
    -0.29883885e-10,
    0.21874425e-12,
    -0.17892321e-14,
    0.11112018e-16,
    -0.30994571e-19,
];

/// Saturation pressure scale at 0 °C in millibars.
const ES0_MBAR: f64 = 6.1078;

/// Specific gas constant for dry air, J/(kg·K)
const R_DRY_AIR: f64 = 287.0531;

/// Specific gas constant for water vapor, J/(kg·K)
const R_WATER_VAPOR: f64 = 461.4964;

const KELVIN_OFFSET: f64 = 273.15;

/// Calculate air density in kg/m³.
///
/// # Arguments
/// * `temperature_c` - Air temperature in °C
/// * `pressure_mbar` - Actual air pressure in millibars (hPa)
/// * `dew_point_c` - Dew point in °C
pub fn air_density(temperature_c: f64, pressure_mbar: f64, dew_point_c: f64) -> f64 {
    // Horner evaluation, highest order coefficient innermost
    let p = WOBUS
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * dew_point_c + c);
    let saturation_mbar = ES0_MBAR / p.powi(8);

    let vapor_pa = saturation_mbar * 100.0;
    let dry_pa = pressure_mbar * 100.0 - vapor_pa;

    let kelvin = temperature_c + KELVIN_OFFSET;
    dry_pa / (R_DRY_AIR * kelvin) + vapor_pa / (R_WATER_VAPOR * kelvin)
}

/// Ambient conditions used to derive air density along a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Atmosphere {
    /// Air temperature in °C
    pub temperature_c: f64,
    /// Dew point in °C
    pub dew_point_c: f64,
    /// Pressure at elevation zero in millibars
    pub sea_level_pressure_mbar: f64,
    /// Exponential pressure falloff height in meters
    pub pressure_scale_height_m: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            temperature_c: 23.8889,
            dew_point_c: 7.5,
            sea_level_pressure_mbar: 1000.0,
            pressure_scale_height_m: 7000.0,
        }
    }
}

impl Atmosphere {
    /// Barometric pressure at the given elevation.
    pub fn pressure_at(&self, elevation_m: f64) -> f64 {
        (-elevation_m / self.pressure_scale_height_m).exp() * self.sea_level_pressure_mbar
    }

    /// Air density at the given elevation.
    pub fn density_at(&self, elevation_m: f64) -> f64 {
        air_density(
            self.temperature_c,
            self.pressure_at(elevation_m),
            self.dew_point_c,
        )
    }
}
