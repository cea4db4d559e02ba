//! Ride export.

pub mod exporter_gpx;
pub mod types;

pub use exporter_gpx::{export_gpx, export_gpx_to_file, generate_gpx_filename};
pub use types::ExportError;
