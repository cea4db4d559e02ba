//! Ride integration: power in, position along the route out.
//!
//! Each tick spends a travel budget ("capacity", 1.0 per tick) across as
//! many route segments as the rider's speed covers in the tick's wall-clock
//! duration. Speed follows the physics model through a first-order filter
//! that is applied once per tick regardless of the tick's length.

use crate::physics::PhysicsEngine;
use crate::route::{interpolate, Route};
use crate::simulation::state::{HistoryRecord, RidingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Speed filter and stop-detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationTunables {
    /// Weight of the model speed in the per-tick speed filter
    pub speed_smoothing: f64,
    /// Below this power a slow rider is considered stopped
    pub stop_power_watts: f64,
    /// Below this speed a low-power rider is considered stopped
    pub stop_speed_mps: f64,
}

impl Default for SimulationTunables {
    fn default() -> Self {
        Self {
            speed_smoothing: 0.2,
            stop_power_watts: 50.0,
            stop_speed_mps: 0.447,
        }
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No time passed since the previous tick
    Idle,
    /// The rider moved (or stood) and a history record was added
    Advanced,
    /// This tick reached the end of the route
    Completed,
    /// The ride was already over; nothing changed
    AlreadyComplete,
}

/// Integrates a rider's progress along a route.
#[derive(Debug, Clone)]
pub struct RideSimulator {
    route: Arc<Route>,
    physics: PhysicsEngine,
    tunables: SimulationTunables,
    state: RidingState,
    history: Vec<HistoryRecord>,
    pending_power: Vec<f64>,
}

impl RideSimulator {
    /// Start a ride at the first point of `route`.
    pub fn new(
        route: Arc<Route>,
        physics: PhysicsEngine,
        tunables: SimulationTunables,
        now: DateTime<Utc>,
    ) -> Self {
        let state = RidingState::start(&route, now);
        Self::resume(route, physics, tunables, state, Vec::new())
    }

    /// Continue a ride from a saved state and history.
    pub fn resume(
        route: Arc<Route>,
        physics: PhysicsEngine,
        tunables: SimulationTunables,
        state: RidingState,
        history: Vec<HistoryRecord>,
    ) -> Self {
        Self {
            route,
            physics,
            tunables,
            state,
            history,
            pending_power: Vec::new(),
        }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn physics(&self) -> &PhysicsEngine {
        &self.physics
    }

    pub fn tunables(&self) -> &SimulationTunables {
        &self.tunables
    }

    pub fn state(&self) -> &RidingState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RidingState {
        &mut self.state
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    /// Fraction of the route covered, in [0, 1].
    pub fn progress(&self) -> f64 {
        let total = self.route.total_distance();
        if total <= 0.0 {
            return if self.state.complete { 1.0 } else { 0.0 };
        }
        (self.state.distance / total).clamp(0.0, 1.0)
    }

    /// Queue a power sample for the next tick.
    pub fn push_power(&mut self, watts: f64) {
        self.pending_power.push(watts);
    }

    pub fn pending_power(&self) -> usize {
        self.pending_power.len()
    }

    pub fn set_heart_rate(&mut self, bpm: Option<f64>) {
        self.state.bpm = bpm;
    }

    pub fn set_cadence(&mut self, rpm: Option<f64>) {
        self.state.rpm = rpm;
    }

    /// Advance the ride to wall time `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.state.complete {
            return TickOutcome::AlreadyComplete;
        }

        let duration = (now - self.state.last_sample_time)
            .num_microseconds()
            .map_or(0.0, |us| us as f64 / 1_000_000.0);
        if duration <= 0.0 {
            return TickOutcome::Idle;
        }
        self.state.last_sample_time = now;

        if !self.pending_power.is_empty() {
            self.state.watts =
                self.pending_power.iter().sum::<f64>() / self.pending_power.len() as f64;
            self.pending_power.clear();
        }

        let points = self.route.points();
        let last = points.len() - 1;
        let watts = self.state.watts;
        let start_speed = self.state.speed;

        let mut capacity = 1.0;
        let mut total_distance = 0.0;
        let mut average_grade = 0.0;
        let mut finished = false;

        while capacity > 0.0 {
            let point = &points[self.state.point_idx];

            let velocity = self
                .physics
                .speed_mps(watts, point.smoothed_grade, point.elevation);
            let mut smoothed = start_speed + (velocity - start_speed) * self.tunables.speed_smoothing;
            if watts < self.tunables.stop_power_watts && smoothed < self.tunables.stop_speed_mps {
                smoothed = 0.0;
            }
            // The cursor never moves backward
            let smoothed = smoothed.max(0.0);

            let can_travel = smoothed * duration * capacity;
            let distance_left = point.distance * (1.0 - self.state.point_pct);

            if can_travel >= distance_left && (can_travel > 0.0 || point.distance == 0.0) {
                let used = if can_travel > 0.0 {
                    distance_left / can_travel
                } else {
                    0.0
                };
                average_grade += point.smoothed_grade * used;
                capacity -= capacity * used;

                self.state.climb += point.climb;
                total_distance += distance_left;
                self.state.point_idx += 1;
                self.state.point_pct = 0.0;

                if self.state.point_idx >= last {
                    finished = true;
                    break;
                }
            } else {
                average_grade += point.smoothed_grade * capacity;
                capacity = 0.0;

                if distance_left != 0.0 {
                    self.state.point_pct = 1.0 - (distance_left - can_travel) / point.distance;
                    total_distance += can_travel;
                } else {
                    self.state.point_pct = 0.0;
                }
            }
        }

        let idx = self.state.point_idx.min(last);
        let point = &points[idx];
        let pct = self.state.point_pct;

        self.state.average_grade = average_grade;
        self.state.distance += total_distance;
        self.state.elevation = point.elevation + point.opposite * pct;
        self.state.speed = total_distance / duration;
        if self.state.speed > 0.0 {
            self.state.elapsed += duration;
        }
        self.state.location = match points.get(idx + 1) {
            Some(next) => interpolate(&point.location, &next.location, pct),
            None => point.location,
        };

        self.history.push(HistoryRecord {
            time: now,
            location: self.state.location,
            power: watts,
            elevation: self.state.elevation,
            heart_rate: self.state.bpm,
            cadence: self.state.rpm,
        });

        if finished {
            self.state.point_idx = points.len();
            self.state.complete = true;
            tracing::info!(
                "Ride complete: {:.0} m in {:.0} s, {:.0} m climbed",
                self.state.distance,
                self.state.elapsed,
                self.state.climb
            );
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }
}
