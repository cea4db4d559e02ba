//! Last-known value of a telemetry channel with a staleness timeout.

use std::time::{Duration, Instant};

/// Default silence after which a reading is dropped.
pub const DEFAULT_READING_TIMEOUT: Duration = Duration::from_millis(5000);

/// Latest value of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelReading {
    last: Option<(f64, Instant)>,
}

impl ChannelReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64, at: Instant) {
        self.last = Some((value, at));
    }

    /// Value at `now`, or `None` once the channel has been silent longer than `timeout`.
    pub fn current(&self, now: Instant, timeout: Duration) -> Option<f64> {
        let (value, at) = self.last?;
        if now.saturating_duration_since(at) > timeout {
            None
        } else {
            Some(value)
        }
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last.map(|(_, at)| at)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
