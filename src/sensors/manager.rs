//! Sensor manager: meter registry, connection state and frame dispatch.
//!
//! Transports own the radio; they register a meter per connected device and
//! hand every notification to [`SensorManager::handle_frame`]. Decoded
//! samples are published on the [`TelemetryBus`].

use crate::sensors::ant::AntMeterLocator;
use crate::sensors::bus::TelemetryBus;
use crate::sensors::meters::FrameMeter;
use crate::sensors::types::{ConnectionState, MeterInfo, SensorError, SensorEvent};
use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

struct RegisteredMeter {
    meter: Box<dyn FrameMeter>,
    state: ConnectionState,
}

/// Manages registered meters and routes their frames to the telemetry bus.
pub struct SensorManager {
    /// Registered frame meters (meter_id -> meter)
    meters: HashMap<String, RegisteredMeter>,
    /// ANT+ bridge meters
    ant: AntMeterLocator,
    /// Telemetry fan-out
    bus: TelemetryBus,
    /// Channel for sending sensor events
    event_tx: Option<Sender<SensorEvent>>,
}

impl SensorManager {
    /// Create a new sensor manager publishing on `bus`.
    pub fn new(bus: TelemetryBus) -> Self {
        Self {
            meters: HashMap::new(),
            ant: AntMeterLocator::new(),
            bus,
            event_tx: None,
        }
    }

    pub fn bus(&self) -> &TelemetryBus {
        &self.bus
    }

    /// Get an event receiver for sensor events.
    pub fn event_receiver(&mut self) -> Receiver<SensorEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.event_tx = Some(tx);
        rx
    }

    /// Send an event if the channel is available.
    fn send_event(&self, event: SensorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Register a connected meter.
    pub fn register(&mut self, meter: Box<dyn FrameMeter>) -> Result<(), SensorError> {
        let info = meter.info();
        if self.meters.contains_key(&info.id) {
            return Err(SensorError::AlreadyRegistered(info.id));
        }

        tracing::info!("Registered {} meter {} ({})", info.protocol, info.name, info.id);
        self.meters.insert(
            info.id.clone(),
            RegisteredMeter {
                meter,
                state: ConnectionState::Connected,
            },
        );
        self.send_event(SensorEvent::MeterFound(info));
        Ok(())
    }

    /// Remove a meter.
    pub fn unregister(&mut self, meter_id: &str) -> Result<(), SensorError> {
        self.meters
            .remove(meter_id)
            .map(|_| ())
            .ok_or_else(|| SensorError::SensorNotFound(meter_id.to_string()))
    }

    /// Registered meters, including ANT+ meters found on the bridge.
    pub fn meters(&self) -> Vec<MeterInfo> {
        self.meters
            .values()
            .map(|registered| registered.meter.info())
            .chain(self.ant.meters().map(|meter| meter.info()))
            .collect()
    }

    pub fn connection_state(&self, meter_id: &str) -> Option<ConnectionState> {
        self.meters.get(meter_id).map(|registered| registered.state)
    }

    fn set_state(&mut self, meter_id: &str, state: ConnectionState) -> Result<(), SensorError> {
        let registered = self
            .meters
            .get_mut(meter_id)
            .ok_or_else(|| SensorError::SensorNotFound(meter_id.to_string()))?;
        registered.state = state;
        self.send_event(SensorEvent::ConnectionChanged {
            meter_id: meter_id.to_string(),
            state,
        });
        Ok(())
    }

    /// The transport lost the device. Frames stop until it reconnects.
    pub fn mark_disconnected(&mut self, meter_id: &str) -> Result<(), SensorError> {
        tracing::warn!("Meter {} disconnected", meter_id);
        self.set_state(meter_id, ConnectionState::Disconnected)
    }

    /// The transport is trying to reconnect the device.
    pub fn mark_reconnecting(&mut self, meter_id: &str) -> Result<(), SensorError> {
        tracing::info!("Reconnecting meter {}", meter_id);
        self.set_state(meter_id, ConnectionState::Reconnecting)
    }

    /// The device is back; frames flow again.
    pub fn mark_reconnected(&mut self, meter_id: &str) -> Result<(), SensorError> {
        tracing::info!("Meter {} reconnected", meter_id);
        self.set_state(meter_id, ConnectionState::Connected)
    }

    /// Decode a raw notification from `meter_id` and publish its samples.
    ///
    /// Returns the number of samples published.
    pub fn handle_frame(
        &mut self,
        meter_id: &str,
        bytes: &[u8],
        at: Instant,
    ) -> Result<usize, SensorError> {
        let registered = self
            .meters
            .get_mut(meter_id)
            .ok_or_else(|| SensorError::SensorNotFound(meter_id.to_string()))?;

        if registered.state != ConnectionState::Connected {
            return Err(SensorError::Disconnected(meter_id.to_string()));
        }

        match registered.meter.ingest(bytes, at) {
            Ok(samples) => {
                let count = samples.len();
                self.bus.publish_all(samples);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Dropping frame from {}: {}", meter_id, e);
                self.send_event(SensorEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Handle a notification on any characteristic of `meter_id`'s device.
    ///
    /// Only the meter's measurement characteristic is decoded; other
    /// characteristics publish nothing.
    pub fn handle_notification(
        &mut self,
        meter_id: &str,
        characteristic: Uuid,
        bytes: &[u8],
        at: Instant,
    ) -> Result<usize, SensorError> {
        let endpoint = self
            .meters
            .get(meter_id)
            .map(|registered| registered.meter.endpoint())
            .ok_or_else(|| SensorError::SensorNotFound(meter_id.to_string()))?;

        if endpoint.characteristic != characteristic {
            tracing::debug!("Ignoring {} notification from {}", characteristic, meter_id);
            return Ok(0);
        }
        self.handle_frame(meter_id, bytes, at)
    }

    /// Route a bridge message to the ANT+ meters and publish its samples.
    pub fn handle_ant_message(&mut self, text: &str, at: Instant) -> Result<usize, SensorError> {
        let update = match self.ant.handle_json(text, at) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!("Dropping ANT+ bridge message: {}", e);
                self.send_event(SensorEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        for info in update.found {
            self.send_event(SensorEvent::MeterFound(info));
        }
        for info in update.renamed {
            self.send_event(SensorEvent::MeterRenamed(info));
        }

        let count = update.samples.len();
        self.bus.publish_all(update.samples);
        Ok(count)
    }
}
