//! Application configuration.
//!
//! Stored as TOML in the platform data directory. Every section has
//! defaults, so a missing file or a partial one loads cleanly.

use crate::physics::{Atmosphere, PhysicsEngine, RiderProfile};
use crate::sensors::BleSpeedCadenceMeter;
use crate::simulation::SimulationTunables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric units (km/h, kg, km)
    #[default]
    Metric,
    /// Imperial units (mph, lbs, miles)
    Imperial,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Metric => write!(f, "Metric"),
            Units::Imperial => write!(f, "Imperial"),
        }
    }
}

impl Units {
    /// Convert speed in m/s to the preferred units.
    pub fn convert_speed(&self, speed_mps: f64) -> (f64, &'static str) {
        match self {
            Units::Metric => (speed_mps * 3.6, "km/h"),
            Units::Imperial => (speed_mps * 2.236_936, "mph"),
        }
    }

    /// Convert distance in meters to the preferred units.
    pub fn convert_distance(&self, distance_m: f64) -> (f64, &'static str) {
        match self {
            Units::Metric => (distance_m / 1000.0, "km"),
            Units::Imperial => (distance_m / 1609.344, "mi"),
        }
    }

    /// Convert elevation in meters to the preferred units.
    pub fn convert_elevation(&self, elevation_m: f64) -> (f64, &'static str) {
        match self {
            Units::Metric => (elevation_m, "m"),
            Units::Imperial => (elevation_m * 3.280_84, "ft"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Display units
    pub units: Units,
    pub rider: RiderSettings,
    pub atmosphere: Atmosphere,
    pub simulation: SimulationSettings,
    pub sensors: SensorSettings,
    pub recording: RecordingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            units: Units::default(),
            rider: RiderSettings::default(),
            atmosphere: Atmosphere::default(),
            simulation: SimulationSettings::default(),
            sensors: SensorSettings::default(),
            recording: RecordingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Physics engine for the configured rider and atmosphere.
    pub fn physics(&self) -> PhysicsEngine {
        PhysicsEngine::new(self.rider.profile(), self.atmosphere)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rider = &self.rider;
        let positive = [
            ("rider.mass_kg", rider.mass_kg),
            ("rider.bike_mass_kg", rider.bike_mass_kg),
            ("rider.frontal_area_m2", rider.frontal_area_m2),
            ("rider.drag_coefficient", rider.drag_coefficient),
            ("rider.rolling_resistance_coeff", rider.rolling_resistance_coeff),
            ("rider.wheel_circumference_m", rider.wheel_circumference_m),
            (
                "atmosphere.pressure_scale_height_m",
                self.atmosphere.pressure_scale_height_m,
            ),
            ("simulation.grade_bandwidth", self.simulation.grade_bandwidth),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..100.0).contains(&rider.drivetrain_loss_percent) {
            return Err(ConfigError::Invalid(format!(
                "rider.drivetrain_loss_percent must be in [0, 100), got {}",
                rider.drivetrain_loss_percent
            )));
        }

        let smoothing = self.simulation.speed_smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "simulation.speed_smoothing must be in (0, 1], got {}",
                smoothing
            )));
        }

        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulation.tick_interval_ms must be at least 1".to_string(),
            ));
        }

        if self.recording.max_saved_rides == 0 {
            return Err(ConfigError::Invalid(
                "recording.max_saved_rides must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Rider and bike settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderSettings {
    /// Rider weight in kilograms
    pub mass_kg: f64,
    /// Bike weight in kilograms
    pub bike_mass_kg: f64,
    /// Frontal area in m²
    pub frontal_area_m2: f64,
    /// Drag coefficient (Cd)
    pub drag_coefficient: f64,
    /// Drivetrain loss percentage
    pub drivetrain_loss_percent: f64,
    /// Coefficient of rolling resistance
    pub rolling_resistance_coeff: f64,
    /// Wheel circumference for CSC speed in meters
    pub wheel_circumference_m: f64,
}

impl Default for RiderSettings {
    fn default() -> Self {
        Self {
            mass_kg: 75.0,
            bike_mass_kg: 8.0,
            frontal_area_m2: 0.65,
            drag_coefficient: 0.63,
            drivetrain_loss_percent: 4.0,
            rolling_resistance_coeff: 0.005,
            wheel_circumference_m: 2.105,
        }
    }
}

impl RiderSettings {
    pub fn profile(&self) -> RiderProfile {
        RiderProfile {
            rider_mass_kg: self.mass_kg,
            bike_mass_kg: self.bike_mass_kg,
            frontal_area_m2: self.frontal_area_m2,
            drag_coefficient: self.drag_coefficient,
            drivetrain_loss_percent: self.drivetrain_loss_percent,
            rolling_resistance_coeff: self.rolling_resistance_coeff,
        }
    }

    /// CSC meter converting wheel revolutions with this bike's circumference.
    pub fn speed_cadence_meter(&self, id: &str, name: &str) -> BleSpeedCadenceMeter {
        BleSpeedCadenceMeter::new(id, name, self.wheel_circumference_m)
    }
}

/// Simulation and route preprocessing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Nominal tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Per-tick speed filter weight
    pub speed_smoothing: f64,
    /// Stop detection power threshold in watts
    pub stop_power_watts: f64,
    /// Stop detection speed threshold in m/s
    pub stop_speed_mps: f64,
    /// Grade smoothing bandwidth in point indices
    pub grade_bandwidth: f64,
    /// Smoothed grade (%) below which climbs are not counted
    pub climb_grade_threshold: f64,
    /// Route resampling spacing in meters
    pub resample_spacing_m: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            speed_smoothing: 0.2,
            stop_power_watts: 50.0,
            stop_speed_mps: 0.447,
            grade_bandwidth: 2.0,
            climb_grade_threshold: 0.95,
            resample_spacing_m: 20.0,
        }
    }
}

impl SimulationSettings {
    pub fn tunables(&self) -> SimulationTunables {
        SimulationTunables {
            speed_smoothing: self.speed_smoothing,
            stop_power_watts: self.stop_power_watts,
            stop_speed_mps: self.stop_speed_mps,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Sensor-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Silence after which a reading is dropped, in milliseconds
    pub reading_timeout_ms: u64,
    /// Virtual power meter emit interval in milliseconds
    pub virtual_power_interval_ms: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            reading_timeout_ms: 5000,
            virtual_power_interval_ms: 750,
        }
    }
}

impl SensorSettings {
    pub fn reading_timeout(&self) -> Duration {
        Duration::from_millis(self.reading_timeout_ms)
    }

    pub fn virtual_power_interval(&self) -> Duration {
        Duration::from_millis(self.virtual_power_interval_ms)
    }
}

/// Recording-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// Auto-save interval in seconds
    pub autosave_interval_secs: u32,
    /// Saved rides kept in the progress store
    pub max_saved_rides: usize,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 30,
            max_saved_rides: 5,
        }
    }
}

impl RecordingSettings {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs as u64)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "pedalsim", "PedalSim")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load configuration from `path`, falling back to defaults when it does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to `path`.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
