//! Error types for archive access.

use serde::Serialize;
use thiserror::Error;
use wave_common::{BoundingBox, TimeRange};

/// Errors from fetching source data.
///
/// `Disjoint*` means the request missed the archive entirely; a
/// partial miss is not an error but yields a [`CoverageGap`] marker.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Requested time window lies entirely outside archive coverage.
    #[error("requested window {requested} is outside archive coverage {coverage}")]
    DisjointTime {
        requested: TimeRange,
        coverage: TimeRange,
    },

    /// Requested area lies entirely outside archive coverage.
    #[error("requested area {requested:?} is outside archive coverage {coverage:?}")]
    DisjointArea {
        requested: BoundingBox,
        coverage: BoundingBox,
    },

    /// Archive does not provide the requested variable.
    #[error("archive does not provide variable {0}")]
    NoVariable(String),

    /// The archive collaborator itself failed (network, storage, ...).
    #[error("archive backend error: {0}")]
    Backend(String),
}

impl CoverageError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether the whole run should abort on this error.
    ///
    /// A totally unreachable backend is fatal; everything else is a
    /// per-window condition the orchestrator can skip past.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoverageError::Backend(_))
    }
}

/// Marker describing how a request was clipped to archive coverage.
///
/// Recorded by the orchestrator so the run report can show which part
/// of the requested window had no source data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGap {
    pub requested: TimeRange,
    pub covered: TimeRange,
}

impl std::fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requested {} but archive covers {}",
            self.requested, self.covered
        )
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, CoverageError>;
