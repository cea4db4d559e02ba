//! Ride simulation
//!
//! Advances a rider along a prepared route from power samples and keeps
//! the per-tick history used for export and resume.

pub mod session;
pub mod simulator;
pub mod state;

pub use session::{RideSession, RideSnapshot};
pub use simulator::{RideSimulator, SimulationTunables, TickOutcome};
pub use state::{HistoryRecord, MapMode, RidingState};
