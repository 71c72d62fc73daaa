//! Regular structured grids.

use tracing::debug;

use wave_common::BoundingBox;

use crate::boundary::{BoundaryPoint, BoundaryPointSet, EdgeSelection};
use crate::error::{DomainError, Result};
use crate::Crs;

/// Metres per degree of latitude (WGS84 mean).
const M_PER_DEG_LAT: f64 = 111_132.0;

/// Relative tolerance for judging a coordinate axis uniform.
const SPACING_TOL: f64 = 1e-4;

/// The enclosing cell of a point, with fractional offsets inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFraction {
    /// Column of the cell's SW corner node, in `[0, nx-2]`.
    pub col: usize,
    /// Row of the cell's SW corner node, in `[0, ny-2]`.
    pub row: usize,
    /// Fractional lon offset within the cell, `[0, 1]`.
    pub fx: f64,
    /// Fractional lat offset within the cell, `[0, 1]`.
    pub fy: f64,
}

/// A regular lon/lat (or projected x/y) grid with a land/sea mask.
///
/// Row-major storage with rows = latitude and row 0 = south, matching
/// the hindcast layout: north is the last row, west the first column.
#[derive(Debug, Clone)]
pub struct StructuredGrid {
    name: String,
    origin_lon: f64,
    origin_lat: f64,
    dlon: f64,
    dlat: f64,
    nx: usize,
    ny: usize,
    /// `true` = sea (computable), `false` = land. Length `nx * ny`.
    sea: Vec<bool>,
    crs: Crs,
}

impl StructuredGrid {
    /// Create a grid from origin (SW node), spacing and counts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        origin_lon: f64,
        origin_lat: f64,
        dlon: f64,
        dlat: f64,
        nx: usize,
        ny: usize,
        sea: Vec<bool>,
        crs: Crs,
    ) -> Result<Self> {
        if dlon <= 0.0 || dlat <= 0.0 {
            return Err(DomainError::InvalidGeometry(format!(
                "spacing must be positive, got dlon={dlon}, dlat={dlat}"
            )));
        }
        if nx < 2 || ny < 2 {
            return Err(DomainError::InvalidGeometry(format!(
                "grid needs at least 2x2 nodes, got {nx}x{ny}"
            )));
        }
        if sea.len() != nx * ny {
            return Err(DomainError::MaskSize {
                expected: nx * ny,
                got: sea.len(),
            });
        }
        if !sea.iter().any(|&s| s) {
            return Err(DomainError::EmptyDomain(format!(
                "grid {name} has no sea points"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            origin_lon,
            origin_lat,
            dlon,
            dlat,
            nx,
            ny,
            sea,
            crs,
        })
    }

    /// Create a grid from explicit coordinate axes, as handed over by
    /// a mesh-reading collaborator.
    ///
    /// Axes must be strictly increasing and uniformly spaced.
    pub fn from_axes(name: &str, lons: &[f64], lats: &[f64], sea: Vec<bool>, crs: Crs) -> Result<Self> {
        validate_axis("longitude", lons)?;
        validate_axis("latitude", lats)?;
        Self::new(
            name,
            lons[0],
            lats[0],
            lons[1] - lons[0],
            lats[1] - lats[0],
            lons.len(),
            lats.len(),
            sea,
            crs,
        )
    }

    /// Create an all-sea grid covering `bbox` at an approximate metric
    /// spacing (metres), the way nested wave grids are usually set up.
    pub fn from_bbox_with_spacing_m(name: &str, bbox: BoundingBox, dm: f64) -> Result<Self> {
        if dm <= 0.0 {
            return Err(DomainError::InvalidGeometry(format!(
                "metric spacing must be positive, got {dm}"
            )));
        }
        let (_, clat) = bbox.center();
        let m_per_deg_lon = M_PER_DEG_LAT * clat.to_radians().cos();
        let nx = ((bbox.width() * m_per_deg_lon / dm).round() as usize).max(1) + 1;
        let ny = ((bbox.height() * M_PER_DEG_LAT / dm).round() as usize).max(1) + 1;
        let dlon = bbox.width() / (nx - 1) as f64;
        let dlat = bbox.height() / (ny - 1) as f64;
        debug!(
            grid = name,
            nx, ny, dlon, dlat, "derived grid spacing from metric resolution"
        );
        Self::new(
            name,
            bbox.min_lon,
            bbox.min_lat,
            dlon,
            dlat,
            nx,
            ny,
            vec![true; nx * ny],
            Crs::Geographic,
        )
    }

    /// Replace the land/sea mask.
    pub fn with_sea_mask(mut self, sea: Vec<bool>) -> Result<Self> {
        if sea.len() != self.nx * self.ny {
            return Err(DomainError::MaskSize {
                expected: self.nx * self.ny,
                got: sea.len(),
            });
        }
        self.sea = sea;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn dlon(&self) -> f64 {
        self.dlon
    }

    pub fn dlat(&self) -> f64 {
        self.dlat
    }

    pub fn node_count(&self) -> usize {
        self.nx * self.ny
    }

    pub fn sea_mask(&self) -> &[bool] {
        &self.sea
    }

    /// Whether the node at (col, row) is sea.
    pub fn is_sea(&self, col: usize, row: usize) -> bool {
        self.sea[row * self.nx + col]
    }

    /// Node position for (col, row), row 0 = south.
    pub fn node_position(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_lon + col as f64 * self.dlon,
            self.origin_lat + row as f64 * self.dlat,
        )
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_lon,
            self.origin_lat,
            self.origin_lon + (self.nx - 1) as f64 * self.dlon,
            self.origin_lat + (self.ny - 1) as f64 * self.dlat,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox().contains(lon, lat)
    }

    /// Enclosing cell and fractional position for a point, `None` if
    /// the point lies outside the grid.
    pub fn locate_cell(&self, lon: f64, lat: f64) -> Option<CellFraction> {
        if !self.contains(lon, lat) {
            return None;
        }
        let x = (lon - self.origin_lon) / self.dlon;
        let y = (lat - self.origin_lat) / self.dlat;
        let col = (x.floor() as usize).min(self.nx - 2);
        let row = (y.floor() as usize).min(self.ny - 2);
        Some(CellFraction {
            col,
            row,
            fx: x - col as f64,
            fy: y - row as f64,
        })
    }

    /// Index of the nearest sea node to a point. Deterministic: ties
    /// resolve to the lowest node index.
    pub fn nearest_sea_node(&self, lon: f64, lat: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for row in 0..self.ny {
            for col in 0..self.nx {
                let idx = row * self.nx + col;
                if !self.sea[idx] {
                    continue;
                }
                let (nlon, nlat) = self.node_position(col, row);
                let d2 = (nlon - lon).powi(2) + (nlat - lat).powi(2);
                if best.map_or(true, |(_, bd)| d2 < bd) {
                    best = Some((idx, d2));
                }
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Perimeter sea cells in grid order: counter-clockwise from the
    /// SW corner (south W->E, east S->N, north E->W, west N->S).
    pub fn boundary_points(&self, edges: &EdgeSelection) -> BoundaryPointSet {
        let mut points = Vec::new();
        let last_col = self.nx - 1;
        let last_row = self.ny - 1;

        let mut push = |col: usize, row: usize| {
            if self.is_sea(col, row) {
                let (lon, lat) = self.node_position(col, row);
                points.push(BoundaryPoint {
                    lon,
                    lat,
                    node: row * self.nx + col,
                });
            }
        };

        if edges.midpoints_only {
            if edges.south {
                push(last_col / 2, 0);
            }
            if edges.east {
                push(last_col, last_row / 2);
            }
            if edges.north {
                push(last_col / 2, last_row);
            }
            if edges.west {
                push(0, last_row / 2);
            }
            return BoundaryPointSet::new(points);
        }

        if edges.south {
            for col in 0..=last_col {
                push(col, 0);
            }
        }
        if edges.east {
            for row in 1..=last_row {
                push(last_col, row);
            }
        }
        if edges.north {
            let upper = if edges.east { last_col - 1 } else { last_col };
            for col in (0..=upper).rev() {
                push(col, last_row);
            }
        }
        if edges.west {
            let upper = if edges.north { last_row - 1 } else { last_row };
            let lower = if edges.south { 1 } else { 0 };
            for row in (lower..=upper).rev() {
                push(0, row);
            }
        }

        BoundaryPointSet::new(points)
    }
}

fn validate_axis(axis: &'static str, values: &[f64]) -> Result<()> {
    if values.len() < 2 {
        return Err(DomainError::InvalidGeometry(format!(
            "{axis} axis needs at least 2 values, got {}",
            values.len()
        )));
    }
    let step = values[1] - values[0];
    for (i, w) in values.windows(2).enumerate() {
        let d = w[1] - w[0];
        if d <= 0.0 {
            return Err(DomainError::NonMonotonicCoordinates { axis, index: i + 1 });
        }
        if (d - step).abs() > step.abs() * SPACING_TOL {
            return Err(DomainError::NonUniformSpacing { axis, index: i + 1 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_3x3() -> StructuredGrid {
        StructuredGrid::new("g", 0.0, 0.0, 1.0, 1.0, 3, 3, vec![true; 9], Crs::Geographic)
            .unwrap()
    }

    #[test]
    fn test_from_axes_validates() {
        let mask = vec![true; 9];
        assert!(StructuredGrid::from_axes(
            "g",
            &[0.0, 1.0, 0.5],
            &[0.0, 1.0, 2.0],
            mask.clone(),
            Crs::Geographic
        )
        .is_err());
        assert!(matches!(
            StructuredGrid::from_axes(
                "g",
                &[0.0, 1.0, 2.5],
                &[0.0, 1.0, 2.0],
                mask.clone(),
                Crs::Geographic
            ),
            Err(DomainError::NonUniformSpacing { .. })
        ));
        assert!(StructuredGrid::from_axes(
            "g",
            &[0.0, 1.0, 2.0],
            &[0.0, 1.0, 2.0],
            mask,
            Crs::Geographic
        )
        .is_ok());
    }

    #[test]
    fn test_mask_size_checked() {
        assert!(matches!(
            StructuredGrid::new("g", 0.0, 0.0, 1.0, 1.0, 3, 3, vec![true; 8], Crs::Geographic),
            Err(DomainError::MaskSize { .. })
        ));
    }

    #[test]
    fn test_locate_cell() {
        let g = grid_3x3();
        let c = g.locate_cell(1.5, 0.25).unwrap();
        assert_eq!((c.col, c.row), (1, 0));
        assert_relative_eq!(c.fx, 0.5);
        assert_relative_eq!(c.fy, 0.25);

        // Far corner clamps to the last cell with fraction 1.
        let c = g.locate_cell(2.0, 2.0).unwrap();
        assert_eq!((c.col, c.row), (1, 1));
        assert_relative_eq!(c.fx, 1.0);
        assert_relative_eq!(c.fy, 1.0);

        assert!(g.locate_cell(2.1, 1.0).is_none());
    }

    #[test]
    fn test_boundary_walk_order() {
        let g = grid_3x3();
        let pts = g.boundary_points(&EdgeSelection::all());
        // 8 perimeter nodes of a 3x3 grid, CCW from SW corner.
        assert_eq!(pts.len(), 8);
        let nodes: Vec<usize> = pts.iter().map(|p| p.node).collect();
        assert_eq!(nodes, vec![0, 1, 2, 5, 8, 7, 6, 3]);
    }

    #[test]
    fn test_boundary_skips_land() {
        let mut mask = vec![true; 9];
        mask[1] = false; // south edge midpoint is land
        let g = StructuredGrid::new("g", 0.0, 0.0, 1.0, 1.0, 3, 3, mask, Crs::Geographic)
            .unwrap();
        let pts = g.boundary_points(&EdgeSelection::all());
        assert_eq!(pts.len(), 7);
        assert!(pts.iter().all(|p| p.node != 1));
    }

    #[test]
    fn test_boundary_edge_subset_midpoints() {
        let g = grid_3x3();
        let pts = g.boundary_points(&EdgeSelection::from_letters("NWS").midpoints());
        assert_eq!(pts.len(), 3);
        let nodes: Vec<usize> = pts.iter().map(|p| p.node).collect();
        // south mid, north mid, west mid
        assert_eq!(nodes, vec![1, 7, 3]);
    }

    #[test]
    fn test_nearest_sea_node() {
        let mut mask = vec![true; 9];
        mask[0] = false;
        let g = StructuredGrid::new("g", 0.0, 0.0, 1.0, 1.0, 3, 3, mask, Crs::Geographic)
            .unwrap();
        // Nearest to the (land) SW corner is one of its neighbours;
        // lowest index wins the tie.
        assert_eq!(g.nearest_sea_node(-0.5, -0.5), Some(1));
    }

    #[test]
    fn test_from_bbox_with_spacing() {
        let g = StructuredGrid::from_bbox_with_spacing_m(
            "skjerjehamn",
            BoundingBox::new(4.00, 60.53, 5.73, 61.25),
            1000.0,
        )
        .unwrap();
        // ~0.72 deg of latitude at 1 km spacing is ~80 cells.
        assert!(g.ny() > 70 && g.ny() < 90);
        assert_relative_eq!(g.bbox().max_lat, 61.25, epsilon = 1e-9);
    }
}
