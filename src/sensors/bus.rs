//! Typed publish/subscribe fan-out for telemetry samples.
//!
//! Each [`TelemetryKind`] keeps its own list of crossbeam senders. A
//! subscriber that dropped its receiver is pruned on the next publish.

use crate::sensors::types::{TelemetryKind, TelemetrySample};
use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared telemetry bus. Cloning yields another handle to the same bus.
#[derive(Debug, Clone, Default)]
pub struct TelemetryBus {
    subscribers: Arc<Mutex<HashMap<TelemetryKind, Vec<Sender<TelemetrySample>>>>>,
}

impl TelemetryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to samples of one kind.
    pub fn subscribe(&self, kind: TelemetryKind) -> Receiver<TelemetrySample> {
        let (tx, rx) = crossbeam::channel::unbounded();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.entry(kind).or_default().push(tx);
        }
        rx
    }

    /// Deliver a sample to every live subscriber of its kind.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, sample: TelemetrySample) -> usize {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return 0;
        };
        let Some(senders) = subscribers.get_mut(&sample.kind) else {
            return 0;
        };

        senders.retain(|tx| tx.send(sample.clone()).is_ok());
        let delivered = senders.len();
        if delivered == 0 {
            tracing::trace!("No subscribers left for {}", sample.kind);
        }
        delivered
    }

    pub fn publish_all(&self, samples: impl IntoIterator<Item = TelemetrySample>) {
        for sample in samples {
            self.publish(sample);
        }
    }

    /// Number of registered subscribers for `kind`, including ones not yet pruned.
    pub fn subscriber_count(&self, kind: TelemetryKind) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}
