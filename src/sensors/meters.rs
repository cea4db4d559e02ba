//! Meter adapters turning raw characteristic values into telemetry samples.
//!
//! Transports (BLE notifications, bridges) are outside this crate; they call
//! [`FrameMeter::ingest`] with the raw bytes of each notification.

use crate::sensors::bus::TelemetryBus;
use crate::sensors::counters::{wheel_speed_mps, RollingCounter};
use crate::sensors::frame::{
    self, TelemetryFrame, CUMULATIVE_CRANK_REVOLUTIONS, CUMULATIVE_WHEEL_REVOLUTIONS,
    INSTANTANEOUS_POWER, LAST_CRANK_EVENT_TIME, LAST_WHEEL_EVENT_TIME,
};
use crate::sensors::gatt::{
    parse_heart_rate_measurement, GattEndpoint, CYCLING_POWER, CYCLING_SPEED_CADENCE, HEART_RATE,
};
use crate::sensors::types::{MeterInfo, Protocol, SensorError, TelemetryKind, TelemetrySample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default emit interval of the virtual power meter.
pub const VIRTUAL_POWER_INTERVAL: Duration = Duration::from_millis(750);

/// Common identity and capabilities of a meter.
pub trait Meter {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn protocol(&self) -> Protocol;
    fn capabilities(&self) -> &[TelemetryKind];

    fn info(&self) -> MeterInfo {
        MeterInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            protocol: self.protocol(),
        }
    }
}

/// A meter fed raw characteristic values.
pub trait FrameMeter: Meter + Send {
    /// Characteristic whose notifications this meter decodes.
    fn endpoint(&self) -> GattEndpoint;

    /// Decode one notification and return the samples it yields.
    fn ingest(&mut self, bytes: &[u8], at: Instant) -> Result<Vec<TelemetrySample>, SensorError>;
}

fn crank_cadence(frame: &TelemetryFrame, counter: &mut RollingCounter) -> Option<f64> {
    let revolutions = frame.get(CUMULATIVE_CRANK_REVOLUTIONS)?;
    let event_time = frame.get(LAST_CRANK_EVENT_TIME)?;
    Some(counter.update(revolutions, event_time))
}

fn wheel_rpm(frame: &TelemetryFrame, counter: &mut RollingCounter) -> Option<f64> {
    let revolutions = frame.get(CUMULATIVE_WHEEL_REVOLUTIONS)?;
    let event_time = frame.get(LAST_WHEEL_EVENT_TIME)?;
    Some(counter.update(revolutions, event_time))
}

/// BLE cycling power meter reporting power only.
#[derive(Debug, Clone)]
pub struct BlePowerMeter {
    id: String,
    name: String,
}

impl BlePowerMeter {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl Meter for BlePowerMeter {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::BleCyclingPower
    }

    fn capabilities(&self) -> &[TelemetryKind] {
        &[TelemetryKind::Power]
    }
}

impl FrameMeter for BlePowerMeter {
    fn endpoint(&self) -> GattEndpoint {
        CYCLING_POWER
    }

    fn ingest(&mut self, bytes: &[u8], at: Instant) -> Result<Vec<TelemetrySample>, SensorError> {
        let frame = frame::decode_cycling_power(bytes)?;
        Ok(frame
            .get(INSTANTANEOUS_POWER)
            .map(|watts| TelemetrySample::new(TelemetryKind::Power, watts as f64, &self.id, at))
            .into_iter()
            .collect())
    }
}

/// BLE cycling power meter that also reports crank revolution data.
#[derive(Debug, Clone)]
pub struct BlePowerCadenceMeter {
    id: String,
    name: String,
    crank: RollingCounter,
}

impl BlePowerCadenceMeter {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            crank: RollingCounter::new(),
        }
    }
}

impl Meter for BlePowerCadenceMeter {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::BleCyclingPower
    }

    fn capabilities(&self) -> &[TelemetryKind] {
        &[TelemetryKind::Power, TelemetryKind::Cadence]
    }
}

impl FrameMeter for BlePowerCadenceMeter {
    fn endpoint(&self) -> GattEndpoint {
        CYCLING_POWER
    }

    fn ingest(&mut self, bytes: &[u8], at: Instant) -> Result<Vec<TelemetrySample>, SensorError> {
        let frame = frame::decode_cycling_power(bytes)?;
        let mut samples = Vec::with_capacity(2);

        if let Some(watts) = frame.get(INSTANTANEOUS_POWER) {
            samples.push(TelemetrySample::new(
                TelemetryKind::Power,
                watts as f64,
                &self.id,
                at,
            ));
        }
        if let Some(rpm) = crank_cadence(&frame, &mut self.crank) {
            samples.push(TelemetrySample::new(TelemetryKind::Cadence, rpm, &self.id, at));
        }

        Ok(samples)
    }
}

/// BLE CSC sensor. Crank and wheel counters are tracked independently.
#[derive(Debug, Clone)]
pub struct BleSpeedCadenceMeter {
    id: String,
    name: String,
    wheel_circumference_m: f64,
    crank: RollingCounter,
    wheel: RollingCounter,
}

impl BleSpeedCadenceMeter {
    pub fn new(id: &str, name: &str, wheel_circumference_m: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            wheel_circumference_m,
            crank: RollingCounter::new(),
            wheel: RollingCounter::new(),
        }
    }
}

impl Meter for BleSpeedCadenceMeter {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::BleCsc
    }

    fn capabilities(&self) -> &[TelemetryKind] {
        &[TelemetryKind::Cadence, TelemetryKind::Speed]
    }
}

impl FrameMeter for BleSpeedCadenceMeter {
    fn endpoint(&self) -> GattEndpoint {
        CYCLING_SPEED_CADENCE
    }

    fn ingest(&mut self, bytes: &[u8], at: Instant) -> Result<Vec<TelemetrySample>, SensorError> {
        let frame = frame::decode_csc(bytes)?;
        let mut samples = Vec::with_capacity(2);

        if let Some(rpm) = crank_cadence(&frame, &mut self.crank) {
            samples.push(TelemetrySample::new(TelemetryKind::Cadence, rpm, &self.id, at));
        }
        if let Some(rpm) = wheel_rpm(&frame, &mut self.wheel) {
            let speed = wheel_speed_mps(rpm, self.wheel_circumference_m);
            samples.push(TelemetrySample::new(TelemetryKind::Speed, speed, &self.id, at));
        }

        Ok(samples)
    }
}

/// BLE heart-rate strap.
#[derive(Debug, Clone)]
pub struct BleHeartRateMeter {
    id: String,
    name: String,
}

impl BleHeartRateMeter {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl Meter for BleHeartRateMeter {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::BleHeartRate
    }

    fn capabilities(&self) -> &[TelemetryKind] {
        &[TelemetryKind::HeartRate]
    }
}

impl FrameMeter for BleHeartRateMeter {
    fn endpoint(&self) -> GattEndpoint {
        HEART_RATE
    }

    fn ingest(&mut self, bytes: &[u8], at: Instant) -> Result<Vec<TelemetrySample>, SensorError> {
        let data = parse_heart_rate_measurement(bytes)?;
        Ok(vec![TelemetrySample::new(
            TelemetryKind::HeartRate,
            data.heart_rate_bpm as f64,
            &self.id,
            at,
        )])
    }
}

/// Software power meter emitting a fixed, adjustable wattage.
///
/// Clones share the wattage, so a handle kept by the caller can adjust the
/// value while a spawned emitter task is running.
#[derive(Debug, Clone)]
pub struct VirtualPowerMeter {
    watts: Arc<AtomicU64>,
    interval: Duration,
}

impl VirtualPowerMeter {
    pub const ID: &'static str = "virtual";

    pub fn new(watts: f64) -> Self {
        Self {
            watts: Arc::new(AtomicU64::new(watts.to_bits())),
            interval: VIRTUAL_POWER_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn watts(&self) -> f64 {
        f64::from_bits(self.watts.load(Ordering::Relaxed))
    }

    pub fn set_watts(&self, watts: f64) {
        self.watts.store(watts.to_bits(), Ordering::Relaxed);
    }

    pub fn sample(&self, at: Instant) -> TelemetrySample {
        TelemetrySample::new(TelemetryKind::Power, self.watts(), Self::ID, at)
    }

    /// Publish the current wattage on `bus` every interval until aborted.
    pub fn spawn(&self, bus: TelemetryBus) -> tokio::task::JoinHandle<()> {
        let meter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(meter.interval);
            loop {
                ticker.tick().await;
                bus.publish(meter.sample(Instant::now()));
            }
        })
    }
}

impl Meter for VirtualPowerMeter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Virtual Power Meter"
    }

    fn protocol(&self) -> Protocol {
        Protocol::Virtual
    }

    fn capabilities(&self) -> &[TelemetryKind] {
        &[TelemetryKind::Power]
    }
}
