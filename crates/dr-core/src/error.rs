//! Error types for drana

use std::path::PathBuf;

use thiserror::Error;

/// drana error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The event source could not be opened or its header could not be read.
    #[error("cannot open event source {}: {source}", .path.display())]
    SourceOpen {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An event record could not be fully decoded. Reported, never fatal:
    /// sources log it and yield whatever part of the record survived.
    #[error("malformed event #{index}: {message}")]
    MalformedEvent {
        /// Zero-based position of the event in the source.
        index: usize,
        /// Decoder message.
        message: String,
    },

    /// Two accumulators with different binning were combined.
    #[error("binning mismatch: {0}")]
    BinningMismatch(String),

    /// The resolution fit did not converge within its iteration budget.
    #[error("fit did not converge: {0}")]
    FitNotConverged(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
