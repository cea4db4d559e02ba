//! Export error types.

use thiserror::Error;

/// Errors that can occur while exporting a ride.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No history to export
    #[error("Ride has no data to export")]
    NoData,

    /// XML writer failure
    #[error("XML error: {0}")]
    XmlError(String),

    /// IO error while writing the file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
