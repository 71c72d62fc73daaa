//! Boundary point sets.

use serde::{Deserialize, Serialize};

/// Which edges of a structured grid contribute boundary points.
///
/// Hindcast nesting often feeds spectra only through the edges facing
/// open water, e.g. north/west/south for a coast on the east side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSelection {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
    /// Keep only the midpoint of each selected edge.
    #[serde(default)]
    pub midpoints_only: bool,
}

impl Default for EdgeSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl EdgeSelection {
    /// All four edges, every perimeter sea cell.
    pub fn all() -> Self {
        Self {
            north: true,
            south: true,
            east: true,
            west: true,
            midpoints_only: false,
        }
    }

    /// A subset of edges by compass letter (`"NWS"` etc).
    pub fn from_letters(letters: &str) -> Self {
        let upper = letters.to_ascii_uppercase();
        Self {
            north: upper.contains('N'),
            south: upper.contains('S'),
            east: upper.contains('E'),
            west: upper.contains('W'),
            midpoints_only: false,
        }
    }

    pub fn midpoints(mut self) -> Self {
        self.midpoints_only = true;
        self
    }
}

/// One location on the target perimeter that needs spectral input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub lon: f64,
    pub lat: f64,
    /// Node index in the owning domain (grid node or mesh node).
    pub node: usize,
}

/// Ordered, immutable set of boundary points.
///
/// Derived from the target domain at construction; the ordering is the
/// ordering the exporter writes locations in, so it must never change
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPointSet {
    points: Vec<BoundaryPoint>,
}

impl BoundaryPointSet {
    pub(crate) fn new(points: Vec<BoundaryPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryPoint> {
        self.points.iter()
    }

    pub fn get(&self, i: usize) -> Option<&BoundaryPoint> {
        self.points.get(i)
    }

    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.lon, p.lat)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_letters() {
        let e = EdgeSelection::from_letters("NwS");
        assert!(e.north && e.west && e.south);
        assert!(!e.east);
        assert!(!e.midpoints_only);
        assert!(EdgeSelection::from_letters("nws").midpoints().midpoints_only);
    }
}
