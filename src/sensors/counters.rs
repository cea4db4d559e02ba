//! Rate derivation from 16-bit rolling revolution counters.
//!
//! CSC and cycling power frames carry cumulative revolution counts and a
//! last-event time in 1/1024 s. Both wrap at 65536.

const WRAP: i64 = 65536;
const EVENT_TIME_RESOLUTION: f64 = 1024.0;

/// Previous (revolutions, event time) pair of one counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollingCounter {
    previous: Option<(i64, i64)>,
}

impl RollingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter that already saw `(revolutions, event_time)`.
    pub fn with_previous(revolutions: i64, event_time: i64) -> Self {
        Self {
            previous: Some((revolutions, event_time)),
        }
    }

    pub fn previous(&self) -> Option<(i64, i64)> {
        self.previous
    }

    /// Feed a new reading and return revolutions per minute.
    ///
    /// The first reading only primes the counter and returns 0. A repeated
    /// event time (no new revolution) also returns 0.
    pub fn update(&mut self, revolutions: i64, event_time: i64) -> f64 {
        let rpm = match self.previous {
            None => 0.0,
            Some((mut last_revs, mut last_time)) => {
                if last_time > event_time {
                    last_time -= WRAP;
                }
                if last_revs > revolutions {
                    last_revs -= WRAP;
                }

                let revs = (revolutions - last_revs) as f64;
                let duration = (event_time - last_time) as f64 / EVENT_TIME_RESOLUTION;
                if duration > 0.0 {
                    revs / duration * 60.0
                } else {
                    0.0
                }
            }
        };

        self.previous = Some((revolutions, event_time));
        rpm
    }
}

/// Road speed in m/s for a wheel turning at `rpm`.
pub fn wheel_speed_mps(rpm: f64, circumference_m: f64) -> f64 {
    rpm / 60.0 * circumference_m
}
