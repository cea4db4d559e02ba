//! PedalSim - indoor cycling ride simulator
//!
//! Turns live power from smart trainers and power meters into a virtual
//! ride along a GPS route: air density and power-to-speed physics, grade
//! smoothing, sensor frame decoding and a tick-driven ride simulator with
//! resumable progress and GPX export.

pub mod metrics;
pub mod physics;
pub mod recording;
pub mod route;
pub mod sensors;
pub mod simulation;
pub mod storage;

// Re-export commonly used types
pub use physics::{PhysicsEngine, RiderProfile};
pub use route::{Route, RouteBuilder, RoutePoint};
pub use sensors::manager::SensorManager;
pub use simulation::{RideSession, RideSimulator, RideSnapshot};
pub use storage::config::AppConfig;
