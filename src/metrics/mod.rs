//! Signal processing shared by route preprocessing and telemetry.

pub mod smoothing;

pub use smoothing::{Bandwidth, Kernel, KernelSmoother, SmoothingError};
