//! Error types for domain loading.

use thiserror::Error;

/// Errors from loading or validating domain geometry.
///
/// All of these are fatal to a run: without a valid domain there is
/// nothing to downscale onto.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Coordinate axis values must be strictly increasing.
    #[error("{axis} coordinates are not strictly increasing at index {index}")]
    NonMonotonicCoordinates { axis: &'static str, index: usize },

    /// Coordinate axis spacing deviates too much from uniform.
    #[error("{axis} coordinate spacing is not uniform (index {index})")]
    NonUniformSpacing { axis: &'static str, index: usize },

    /// Grid spacing or extent is not positive.
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    /// Mask array does not match the node/cell count.
    #[error("mask has {got} entries, domain has {expected} nodes")]
    MaskSize { expected: usize, got: usize },

    /// Mesh connectivity references a node that does not exist.
    #[error("triangle {triangle} references out-of-range node {node} (mesh has {node_count})")]
    InvalidConnectivity {
        triangle: usize,
        node: usize,
        node_count: usize,
    },

    /// A triangle with (near-)zero area.
    #[error("triangle {0} is degenerate")]
    DegenerateTriangle(usize),

    /// Domain has no nodes or no sea points.
    #[error("domain is empty: {0}")]
    EmptyDomain(String),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
