//! Sensor module for BLE and ANT+ telemetry.

pub mod ant;
pub mod bus;
pub mod counters;
pub mod frame;
pub mod gatt;
pub mod manager;
pub mod meters;
pub mod reading;
pub mod types;

pub use ant::{AntMessage, AntMeter, AntMeterLocator, AntProfile, LocatorUpdate};
pub use bus::TelemetryBus;
pub use counters::{wheel_speed_mps, RollingCounter};
pub use frame::{
    decode_csc, decode_cycling_power, FieldKind, FieldSpec, FrameSchema, MaskWidth, SchemaEntry,
    TelemetryFrame, CSC_MEASUREMENT, CYCLING_POWER_MEASUREMENT,
};
pub use gatt::{
    parse_heart_rate_measurement, GattEndpoint, HeartRateData, CYCLING_POWER, CYCLING_SPEED_CADENCE,
    HEART_RATE,
};
pub use manager::SensorManager;
pub use meters::{
    BleHeartRateMeter, BlePowerCadenceMeter, BlePowerMeter, BleSpeedCadenceMeter, FrameMeter,
    Meter, VirtualPowerMeter,
};
pub use reading::ChannelReading;
pub use types::{
    ConnectionState, MeterInfo, Protocol, SensorError, SensorEvent, TelemetryKind,
    TelemetrySample,
};
