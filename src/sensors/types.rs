//! Sensor types and enums for power, cadence and heart-rate meters.
//!
//! Meters are external event sources: transports hand them raw BLE
//! characteristic values or ANT+ bridge messages, and they emit
//! [`TelemetrySample`]s for the ride loop.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Kind of scalar reading a meter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    /// Instantaneous power in watts
    Power,
    /// Crank cadence in RPM
    Cadence,
    /// Heart rate in BPM
    HeartRate,
    /// Wheel-derived speed in m/s
    Speed,
}

impl TelemetryKind {
    pub const ALL: [TelemetryKind; 4] = [
        TelemetryKind::Power,
        TelemetryKind::Cadence,
        TelemetryKind::HeartRate,
        TelemetryKind::Speed,
    ];
}

impl std::fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryKind::Power => write!(f, "Power"),
            TelemetryKind::Cadence => write!(f, "Cadence"),
            TelemetryKind::HeartRate => write!(f, "Heart Rate"),
            TelemetryKind::Speed => write!(f, "Speed"),
        }
    }
}

/// Transport a meter's data arrives over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// BLE Cycling Power Service (0x1818)
    BleCyclingPower,
    /// BLE Cycling Speed and Cadence (0x1816)
    BleCsc,
    /// BLE Heart Rate Service (0x180D)
    BleHeartRate,
    /// ANT+ messages relayed by a bridge
    Ant,
    /// Software-generated readings
    Virtual,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::BleCyclingPower => write!(f, "Cycling Power"),
            Protocol::BleCsc => write!(f, "Cycling Speed/Cadence"),
            Protocol::BleHeartRate => write!(f, "Heart Rate"),
            Protocol::Ant => write!(f, "ANT+"),
            Protocol::Virtual => write!(f, "Virtual"),
        }
    }
}

/// Connection state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Active connection
    Connected,
    /// Auto-reconnect in progress
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Reconnecting => write!(f, "Reconnecting..."),
        }
    }
}

/// Identity of a meter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterInfo {
    /// Stable identifier (device address or ANT+ profile + device number)
    pub id: String,
    /// User-friendly name
    pub name: String,
    /// Communication protocol
    pub protocol: Protocol,
}

/// One scalar reading emitted by a meter.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    /// What was measured
    pub kind: TelemetryKind,
    /// Value in the kind's unit
    pub value: f64,
    /// Source meter ID
    pub meter_id: String,
    /// When the reading was received
    pub received_at: Instant,
}

impl TelemetrySample {
    pub fn new(kind: TelemetryKind, value: f64, meter_id: &str, received_at: Instant) -> Self {
        Self {
            kind,
            value,
            meter_id: meter_id.to_string(),
            received_at,
        }
    }
}

/// Events from the sensor system.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// A meter was registered or discovered on a bridge
    MeterFound(MeterInfo),
    /// A meter's display name changed
    MeterRenamed(MeterInfo),
    /// Sensor connection state changed
    ConnectionChanged {
        meter_id: String,
        state: ConnectionState,
    },
    /// A frame could not be decoded
    Error(String),
}

/// Errors that can occur in the sensor system.
#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    /// Frame shorter than the layout its flags announce
    #[error("Malformed telemetry frame for {schema}: need {expected} bytes, got {actual}")]
    MalformedFrame {
        schema: &'static str,
        expected: usize,
        actual: usize,
    },

    /// No meter registered under this ID
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// Meter ID already registered
    #[error("Sensor already registered: {0}")]
    AlreadyRegistered(String),

    /// Frame arrived while the meter is not connected
    #[error("Sensor disconnected: {0}")]
    Disconnected(String),

    /// Bridge message could not be parsed
    #[error("Invalid bridge message: {0}")]
    InvalidMessage(String),
}
