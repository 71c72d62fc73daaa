//! Error types for exporting.

use thiserror::Error;

/// Errors from serializing output files.
///
/// Recoverable per window: the orchestrator skips the window and
/// records the failure.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A value cannot be represented in the target layout.
    #[error("value {value} is not representable in the {what} field")]
    Unrepresentable { what: &'static str, value: f64 },

    /// Spectrum bin count disagrees with the declared basis.
    #[error("spectrum has {got} bins, declared basis has {expected}")]
    BinCountMismatch { expected: usize, got: usize },

    /// Sample count disagrees with the declared location list.
    #[error("timestep has {got} spectra, header declares {expected} locations")]
    LocationCountMismatch { expected: usize, got: usize },

    /// Nothing to write.
    #[error("cannot export an empty series")]
    EmptySeries,

    /// Wind forcing requires both u and v components.
    #[error("wind forcing requires a vector field, got a scalar field")]
    NotVector,

    /// Snapshots in one series disagree on shape.
    #[error("field shape changed mid-series: {0}")]
    ShapeChanged(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, FormatError>;
