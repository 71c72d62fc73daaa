//! Spatial domains for wave downscaling.
//!
//! A [`Domain`] is either a regular structured grid or a triangular
//! unstructured mesh. Both expose the same capability surface: a land/
//! sea mask, an ordered set of open-boundary points, and point lookup.
//! Domains are immutable after loading and shared read-only by every
//! downstream pipeline stage.

pub mod boundary;
pub mod error;
pub mod structured;
pub mod unstructured;

pub use boundary::{BoundaryPoint, BoundaryPointSet, EdgeSelection};
pub use error::{DomainError, Result};
pub use structured::StructuredGrid;
pub use unstructured::{TriangleIndex, UnstructuredMesh};

use wave_common::BoundingBox;

/// Coordinate reference system tag for a domain's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// Geographic lon/lat in degrees (WGS84).
    #[default]
    Geographic,
    /// Projected x/y in metres; treated as planar.
    Projected,
}

/// A target or source spatial domain.
///
/// Modeled as a tagged variant rather than a trait hierarchy so the
/// interpolators can match on topology while everything else goes
/// through the shared methods below.
#[derive(Debug, Clone)]
pub enum Domain {
    Structured(StructuredGrid),
    Unstructured(UnstructuredMesh),
}

impl Domain {
    pub fn name(&self) -> &str {
        match self {
            Domain::Structured(g) => g.name(),
            Domain::Unstructured(m) => m.name(),
        }
    }

    pub fn crs(&self) -> Crs {
        match self {
            Domain::Structured(g) => g.crs(),
            Domain::Unstructured(m) => m.crs(),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Domain::Structured(g) => g.bbox(),
            Domain::Unstructured(m) => m.bbox(),
        }
    }

    /// Number of nodes (structured: grid points).
    pub fn node_count(&self) -> usize {
        match self {
            Domain::Structured(g) => g.node_count(),
            Domain::Unstructured(m) => m.node_count(),
        }
    }

    /// Whether the point lies inside the domain (point-in-cell for
    /// grids, point-in-triangle for meshes).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Domain::Structured(g) => g.contains(lon, lat),
            Domain::Unstructured(m) => m.contains(lon, lat),
        }
    }

    /// Ordered boundary points where spectral input must be supplied.
    ///
    /// Structured grids walk their perimeter sea cells; meshes return
    /// the nodes flagged as open boundary. The edge selection only
    /// applies to structured grids.
    pub fn boundary_points(&self, edges: &EdgeSelection) -> BoundaryPointSet {
        match self {
            Domain::Structured(g) => g.boundary_points(edges),
            Domain::Unstructured(m) => m.boundary_points(),
        }
    }
}
