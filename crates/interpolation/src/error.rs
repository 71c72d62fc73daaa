//! Error types for interpolation.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors from spatial, spectral or temporal interpolation.
#[derive(Debug, Error)]
pub enum InterpolationError {
    /// Source series has a hole wider than the configured maximum.
    ///
    /// Recoverable per window: the orchestrator skips the affected
    /// window instead of silently interpolating across the hole.
    #[error("source gap of {gap} between {before} and {after} exceeds maximum {max_gap}")]
    TemporalGap {
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        gap: Duration,
        max_gap: Duration,
    },

    /// Cannot resample an empty source series.
    #[error("source series is empty")]
    EmptySeries,

    /// Two snapshots in one series disagree on shape.
    #[error("series values have mismatched shapes")]
    ShapeMismatch,

    /// Value count does not match the domain node count.
    #[error("got {got} source values for a domain of {expected} nodes")]
    ValueCount { expected: usize, got: usize },
}

/// Result type for interpolation operations.
pub type Result<T> = std::result::Result<T, InterpolationError>;
