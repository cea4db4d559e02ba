//! Ride session: telemetry in, timed ticks, autosave and resume.

use crate::route::{Route, RoutePoint};
use crate::sensors::{ChannelReading, TelemetryBus, TelemetryKind, TelemetrySample};
use crate::simulation::simulator::{RideSimulator, TickOutcome};
use crate::simulation::state::{HistoryRecord, RidingState};
use crate::storage::{AppConfig, ProgressError, ProgressStore, Units};
use chrono::{DateTime, Utc};
use crossbeam::channel::Receiver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Everything needed to continue a ride later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSnapshot {
    pub id: Uuid,
    pub route_name: String,
    pub route_points: Vec<RoutePoint>,
    pub state: RidingState,
    pub history: Vec<HistoryRecord>,
    pub rider_mass_kg: f64,
    pub units: Units,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Subscriptions {
    power: Option<Receiver<TelemetrySample>>,
    heart_rate: Option<Receiver<TelemetrySample>>,
    cadence: Option<Receiver<TelemetrySample>>,
}

/// A ride on one route, fed by telemetry subscriptions.
#[derive(Debug)]
pub struct RideSession {
    id: Uuid,
    simulator: RideSimulator,
    units: Units,
    subscriptions: Subscriptions,
    power: ChannelReading,
    heart_rate: ChannelReading,
    cadence: ChannelReading,
    reading_timeout: Duration,
    store: Option<ProgressStore>,
    autosave_interval: Duration,
    last_autosave: Option<Instant>,
}

impl RideSession {
    /// Start a new ride on `route` with the configured rider and atmosphere.
    pub fn new(route: Arc<Route>, config: &AppConfig, now: DateTime<Utc>) -> Self {
        let simulator =
            RideSimulator::new(route, config.physics(), config.simulation.tunables(), now);
        Self::with_simulator(Uuid::new_v4(), simulator, config)
    }

    /// Resume a saved ride. The pause is not ridden: the tick clock restarts at `now`.
    ///
    /// A snapshot whose cursor is not on its own route is rejected.
    pub fn from_snapshot(
        snapshot: RideSnapshot,
        config: &AppConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        let route = Arc::new(Route::new(&snapshot.route_name, snapshot.route_points)?);
        if !snapshot.state.is_on(&route) {
            return Err(ProgressError::Corrupt(format!(
                "position {} + {} is off a {}-point route",
                snapshot.state.point_idx,
                snapshot.state.point_pct,
                route.len()
            )));
        }

        let mut physics = config.physics();
        physics.set_rider_mass(snapshot.rider_mass_kg);

        let mut state = snapshot.state;
        state.last_sample_time = now;

        let simulator = RideSimulator::resume(
            route,
            physics,
            config.simulation.tunables(),
            state,
            snapshot.history,
        );

        let mut session = Self::with_simulator(snapshot.id, simulator, config);
        session.units = snapshot.units;
        tracing::info!(
            "Resumed ride {} at {:.0} m",
            session.id,
            session.simulator.state().distance
        );
        Ok(session)
    }

    fn with_simulator(id: Uuid, simulator: RideSimulator, config: &AppConfig) -> Self {
        Self {
            id,
            simulator,
            units: config.units,
            subscriptions: Subscriptions::default(),
            power: ChannelReading::new(),
            heart_rate: ChannelReading::new(),
            cadence: ChannelReading::new(),
            reading_timeout: config.sensors.reading_timeout(),
            store: None,
            autosave_interval: config.recording.autosave_interval(),
            last_autosave: None,
        }
    }

    /// Save progress to `store` while riding.
    pub fn with_store(mut self, store: ProgressStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn simulator(&self) -> &RideSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut RideSimulator {
        &mut self.simulator
    }

    pub fn state(&self) -> &RidingState {
        self.simulator.state()
    }

    pub fn history(&self) -> &[HistoryRecord] {
        self.simulator.history()
    }

    pub fn is_complete(&self) -> bool {
        self.simulator.is_complete()
    }

    pub fn collect_power(&mut self, rx: Receiver<TelemetrySample>) {
        self.subscriptions.power = Some(rx);
    }

    pub fn collect_heart_rate(&mut self, rx: Receiver<TelemetrySample>) {
        self.subscriptions.heart_rate = Some(rx);
    }

    pub fn collect_cadence(&mut self, rx: Receiver<TelemetrySample>) {
        self.subscriptions.cadence = Some(rx);
    }

    /// Subscribe to power, heart rate and cadence on `bus`.
    pub fn subscribe(&mut self, bus: &TelemetryBus) {
        self.collect_power(bus.subscribe(TelemetryKind::Power));
        self.collect_heart_rate(bus.subscribe(TelemetryKind::HeartRate));
        self.collect_cadence(bus.subscribe(TelemetryKind::Cadence));
    }

    fn latest(rx: &Option<Receiver<TelemetrySample>>, reading: &mut ChannelReading) {
        if let Some(rx) = rx {
            for sample in rx.try_iter() {
                reading.update(sample.value, sample.received_at);
            }
        }
    }

    fn drain(&mut self, instant: Instant) {
        let mut power_samples = 0;
        if let Some(rx) = &self.subscriptions.power {
            for sample in rx.try_iter() {
                self.power.update(sample.value, sample.received_at);
                self.simulator.push_power(sample.value);
                power_samples += 1;
            }
        }
        if power_samples == 0
            && self.simulator.pending_power() == 0
            && self.power.current(instant, self.reading_timeout).is_none()
        {
            self.simulator.push_power(0.0);
        }

        Self::latest(&self.subscriptions.heart_rate, &mut self.heart_rate);
        Self::latest(&self.subscriptions.cadence, &mut self.cadence);

        let bpm = self.heart_rate.current(instant, self.reading_timeout);
        let rpm = self.cadence.current(instant, self.reading_timeout);
        self.simulator.set_heart_rate(bpm);
        self.simulator.set_cadence(rpm);
    }

    /// Drain telemetry and advance the ride to the given wall and monotonic times.
    pub fn tick_at(&mut self, now: DateTime<Utc>, instant: Instant) -> TickOutcome {
        if self.simulator.is_complete() {
            return TickOutcome::AlreadyComplete;
        }
        self.drain(instant);
        self.simulator.tick(now)
    }

    /// Drain telemetry and advance the ride to the current time.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Utc::now(), Instant::now())
    }

    pub fn snapshot(&self) -> RideSnapshot {
        let route = self.simulator.route();
        RideSnapshot {
            id: self.id,
            route_name: route.name().to_string(),
            route_points: route.points().to_vec(),
            state: self.simulator.state().clone(),
            history: self.simulator.history().to_vec(),
            rider_mass_kg: self.simulator.physics().rider.rider_mass_kg,
            units: self.units,
            saved_at: Utc::now(),
        }
    }

    /// Write a snapshot if a store is attached.
    pub fn save_progress(&mut self) -> Result<(), ProgressError> {
        if let Some(store) = &self.store {
            store.save(&self.snapshot())?;
            tracing::debug!("Autosaved ride {}", self.id);
        }
        self.last_autosave = Some(Instant::now());
        Ok(())
    }

    fn autosave_due(&self, instant: Instant) -> bool {
        self.store.is_some()
            && self
                .last_autosave
                .map_or(true, |last| instant.duration_since(last) >= self.autosave_interval)
    }

    /// Drive ticks every `interval` until the ride completes.
    ///
    /// A tick that overruns delays the following ones rather than bursting
    /// to catch up. Progress is saved every autosave interval and removed
    /// from the store once the ride is complete.
    pub async fn run(&mut self, interval: Duration) -> Result<(), ProgressError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately
        ticker.tick().await;
        self.last_autosave = Some(Instant::now());

        tracing::info!("Riding '{}'", self.simulator.route().name());

        loop {
            ticker.tick().await;
            let instant = Instant::now();

            match self.tick_at(Utc::now(), instant) {
                TickOutcome::Completed | TickOutcome::AlreadyComplete => break,
                TickOutcome::Idle | TickOutcome::Advanced => {}
            }

            if self.autosave_due(instant) {
                if let Err(e) = self.save_progress() {
                    tracing::warn!("Autosave failed: {}", e);
                }
            }
        }

        if let Some(store) = &self.store {
            store.remove(&self.id.to_string())?;
        }
        Ok(())
    }
}
