//! ANT+ meters fed by a bridge.
//!
//! An ANT+ bridge decodes broadcast pages and relays one JSON message per
//! page, tagged with the device profile (`hr`, `bike_power`,
//! `speed_cadence`) and the transmitting device number. The locator here
//! creates a meter the first time a (profile, device) pair is seen and
//! routes every later message to the meters of that device.

pub mod manufacturers;

use crate::sensors::types::{MeterInfo, Protocol, SensorError, TelemetryKind, TelemetrySample};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

pub use manufacturers::{display_name, manufacturer_name};

/// ANT+ device profiles relayed by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntProfile {
    /// Heart Rate Monitor (Device Type 120)
    #[serde(rename = "hr")]
    HeartRate,
    /// Power Meter (Device Type 11)
    #[serde(rename = "bike_power")]
    BikePower,
    /// Speed/Cadence Sensor (Device Type 121, 122, 123)
    #[serde(rename = "speed_cadence")]
    SpeedCadence,
}

impl AntProfile {
    /// Bridge tag of the profile
    pub fn tag(&self) -> &'static str {
        match self {
            AntProfile::HeartRate => "hr",
            AntProfile::BikePower => "bike_power",
            AntProfile::SpeedCadence => "speed_cadence",
        }
    }

    /// Create from a bridge tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "hr" => Some(AntProfile::HeartRate),
            "bike_power" => Some(AntProfile::BikePower),
            "speed_cadence" => Some(AntProfile::SpeedCadence),
            _ => None,
        }
    }

    /// The reading a meter of this profile reports
    pub fn kind(&self) -> TelemetryKind {
        match self {
            AntProfile::HeartRate => TelemetryKind::HeartRate,
            AntProfile::BikePower => TelemetryKind::Power,
            AntProfile::SpeedCadence => TelemetryKind::Cadence,
        }
    }
}

/// One decoded page relayed by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AntMessage {
    #[serde(rename = "type")]
    pub profile: String,
    #[serde(rename = "DeviceID")]
    pub device_id: u32,
    #[serde(rename = "ManId", default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<u16>,
    #[serde(rename = "ModelNum", default, skip_serializing_if = "Option::is_none")]
    pub model_number: Option<u16>,
    #[serde(rename = "Power", default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(rename = "Cadence", default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(
        rename = "CalculatedCadence",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub calculated_cadence: Option<f64>,
    #[serde(
        rename = "ComputedHeartRate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub computed_heart_rate: Option<f64>,
}

impl AntMessage {
    pub fn from_json(text: &str) -> Result<Self, SensorError> {
        serde_json::from_str(text).map_err(|e| SensorError::InvalidMessage(e.to_string()))
    }

    /// Cadence carried by the message; the calculated value wins.
    pub fn cadence_rpm(&self) -> Option<f64> {
        self.calculated_cadence.or(self.cadence)
    }

    fn has_cadence(&self) -> bool {
        [self.cadence, self.calculated_cadence]
            .iter()
            .flatten()
            .any(|rpm| *rpm != 0.0)
    }
}

/// A meter backed by one ANT+ device profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AntMeter {
    id: String,
    name: String,
    profile: AntProfile,
    device_id: u32,
    manufacturer_id: Option<u16>,
    model_number: Option<u16>,
}

impl AntMeter {
    pub fn new(
        profile: AntProfile,
        device_id: u32,
        manufacturer_id: Option<u16>,
        model_number: Option<u16>,
    ) -> Self {
        let mut meter = Self {
            id: format!("{}{}", profile.tag(), device_id),
            name: String::new(),
            profile,
            device_id,
            manufacturer_id,
            model_number,
        };
        meter.refresh_name();
        meter
    }

    fn refresh_name(&mut self) {
        let manufacturer = self
            .manufacturer_id
            .and_then(manufacturer_name)
            .map(display_name)
            .unwrap_or_else(|| "Unknown".to_string());
        self.name = format!("{} - {}", manufacturer, self.device_id);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> AntProfile {
        self.profile
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn info(&self) -> MeterInfo {
        MeterInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            protocol: Protocol::Ant,
        }
    }

    /// Sample carried by `message` for this meter's profile, if any.
    pub fn handle(&self, message: &AntMessage, at: Instant) -> Option<TelemetrySample> {
        let value = match self.profile {
            AntProfile::BikePower => message.power,
            AntProfile::SpeedCadence => message.cadence_rpm(),
            AntProfile::HeartRate => message.computed_heart_rate,
        }?;
        Some(TelemetrySample::new(self.profile.kind(), value, &self.id, at))
    }

    /// Apply manufacturer/model updates. Returns true when the name changed.
    fn update_identity(&mut self, message: &AntMessage) -> bool {
        let mut changed = false;
        if message.manufacturer_id.is_some() && message.manufacturer_id != self.manufacturer_id {
            self.manufacturer_id = message.manufacturer_id;
            changed = true;
        }
        if message.model_number.is_some() && message.model_number != self.model_number {
            self.model_number = message.model_number;
            changed = true;
        }
        if changed {
            self.refresh_name();
        }
        changed
    }
}

/// Result of routing one bridge message.
#[derive(Debug, Clone, Default)]
pub struct LocatorUpdate {
    /// Meters created by this message
    pub found: Vec<MeterInfo>,
    /// Meters whose name changed
    pub renamed: Vec<MeterInfo>,
    /// Readings carried by the message
    pub samples: Vec<TelemetrySample>,
}

/// Creates and feeds ANT+ meters from bridge messages.
#[derive(Debug, Default)]
pub struct AntMeterLocator {
    meters: HashMap<String, AntMeter>,
    by_device: HashMap<u32, Vec<String>>,
}

impl AntMeterLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meter(&self, id: &str) -> Option<&AntMeter> {
        self.meters.get(id)
    }

    pub fn meters(&self) -> impl Iterator<Item = &AntMeter> {
        self.meters.values()
    }

    pub fn handle_json(&mut self, text: &str, at: Instant) -> Result<LocatorUpdate, SensorError> {
        let message = AntMessage::from_json(text)?;
        Ok(self.handle_message(&message, at))
    }

    /// Route a message: create meters on first sight, collect samples from
    /// every meter of the device, then apply identity changes.
    pub fn handle_message(&mut self, message: &AntMessage, at: Instant) -> LocatorUpdate {
        let mut update = LocatorUpdate::default();

        let mut profiles = Vec::with_capacity(2);
        match AntProfile::from_tag(&message.profile) {
            Some(profile) => profiles.push(profile),
            None => tracing::debug!("Ignoring ANT+ profile {}", message.profile),
        }
        // Power meters broadcasting crank data also act as cadence meters
        if profiles.first() == Some(&AntProfile::BikePower) && message.has_cadence() {
            profiles.push(AntProfile::SpeedCadence);
        }

        for profile in profiles {
            let id = format!("{}{}", profile.tag(), message.device_id);
            if self.meters.contains_key(&id) {
                continue;
            }

            let meter = AntMeter::new(
                profile,
                message.device_id,
                message.manufacturer_id,
                message.model_number,
            );
            tracing::info!("Found ANT+ meter {} ({})", meter.name(), meter.id());
            update.found.push(meter.info());
            self.by_device
                .entry(message.device_id)
                .or_default()
                .push(id.clone());
            self.meters.insert(id, meter);
        }

        let Some(ids) = self.by_device.get(&message.device_id) else {
            return update;
        };

        for id in ids {
            let Some(meter) = self.meters.get_mut(id) else {
                continue;
            };
            if let Some(sample) = meter.handle(message, at) {
                update.samples.push(sample);
            }
            if meter.update_identity(message) {
                update.renamed.push(meter.info());
            }
        }

        update
    }
}
