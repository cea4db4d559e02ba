//! Storage module for configuration and saved ride progress.

pub mod config;
pub mod progress;

pub use config::{
    load_config, load_config_from, save_config, save_config_to, AppConfig, ConfigError,
    RecordingSettings, RiderSettings, SensorSettings, SimulationSettings, Units,
};
pub use progress::{ProgressError, ProgressStore};
