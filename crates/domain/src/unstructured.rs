//! Triangular unstructured meshes.

use tracing::debug;

use wave_common::BoundingBox;

use crate::boundary::{BoundaryPoint, BoundaryPointSet};
use crate::error::{DomainError, Result};
use crate::Crs;

/// Triangle area below which connectivity is considered degenerate.
const MIN_TRIANGLE_AREA: f64 = 1e-14;

/// A triangular mesh with per-node land/sea and open-boundary flags.
///
/// The mesh reader collaborator supplies node coordinates and
/// connectivity; this type only validates and indexes them.
#[derive(Debug, Clone)]
pub struct UnstructuredMesh {
    name: String,
    /// Node positions as (lon, lat).
    nodes: Vec<(f64, f64)>,
    /// Node-index triples, counter-clockwise.
    triangles: Vec<[usize; 3]>,
    /// `true` = sea, per node.
    sea: Vec<bool>,
    /// Nodes where spectral boundary input is applied, per node.
    open_boundary: Vec<bool>,
    bbox: BoundingBox,
    index: TriangleIndex,
    crs: Crs,
}

impl UnstructuredMesh {
    /// Validate geometry and build the spatial index.
    pub fn load(
        name: &str,
        nodes: Vec<(f64, f64)>,
        triangles: Vec<[usize; 3]>,
        sea: Vec<bool>,
        open_boundary: Vec<bool>,
        crs: Crs,
    ) -> Result<Self> {
        if nodes.is_empty() || triangles.is_empty() {
            return Err(DomainError::EmptyDomain(format!(
                "mesh {name} has {} nodes and {} triangles",
                nodes.len(),
                triangles.len()
            )));
        }
        if sea.len() != nodes.len() {
            return Err(DomainError::MaskSize {
                expected: nodes.len(),
                got: sea.len(),
            });
        }
        if open_boundary.len() != nodes.len() {
            return Err(DomainError::MaskSize {
                expected: nodes.len(),
                got: open_boundary.len(),
            });
        }
        for (ti, tri) in triangles.iter().enumerate() {
            for &n in tri {
                if n >= nodes.len() {
                    return Err(DomainError::InvalidConnectivity {
                        triangle: ti,
                        node: n,
                        node_count: nodes.len(),
                    });
                }
            }
            let [a, b, c] = *tri;
            if signed_area(nodes[a], nodes[b], nodes[c]).abs() < MIN_TRIANGLE_AREA {
                return Err(DomainError::DegenerateTriangle(ti));
            }
        }

        let bbox = nodes_bbox(&nodes);
        let index = TriangleIndex::build(&nodes, &triangles, bbox);
        debug!(
            mesh = name,
            nodes = nodes.len(),
            triangles = triangles.len(),
            "mesh loaded and indexed"
        );
        Ok(Self {
            name: name.to_string(),
            nodes,
            triangles,
            sea,
            open_boundary,
            bbox,
            index,
            crs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[(f64, f64)] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn sea_mask(&self) -> &[bool] {
        &self.sea
    }

    pub fn is_sea(&self, node: usize) -> bool {
        self.sea[node]
    }

    pub fn index(&self) -> &TriangleIndex {
        &self.index
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.index.locate(&self.nodes, &self.triangles, lon, lat).is_some()
    }

    /// Nodes flagged as open boundary, in node order.
    pub fn boundary_points(&self) -> BoundaryPointSet {
        let points = self
            .open_boundary
            .iter()
            .enumerate()
            .filter(|(_, &open)| open)
            .map(|(i, _)| {
                let (lon, lat) = self.nodes[i];
                BoundaryPoint { lon, lat, node: i }
            })
            .collect();
        BoundaryPointSet::new(points)
    }

    /// Nearest sea node to a point; ties resolve to the lowest index.
    pub fn nearest_sea_node(&self, lon: f64, lat: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &(nlon, nlat)) in self.nodes.iter().enumerate() {
            if !self.sea[i] {
                continue;
            }
            let d2 = (nlon - lon).powi(2) + (nlat - lat).powi(2);
            if best.map_or(true, |(_, bd)| d2 < bd) {
                best = Some((i, d2));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Uniform-bucket spatial index over mesh triangles.
///
/// Built once per mesh; lookups scan only the triangles whose bounding
/// box overlaps the bucket containing the query point, in triangle
/// order, so results are deterministic.
#[derive(Debug, Clone)]
pub struct TriangleIndex {
    bbox: BoundingBox,
    ncols: usize,
    nrows: usize,
    buckets: Vec<Vec<usize>>,
}

impl TriangleIndex {
    fn build(nodes: &[(f64, f64)], triangles: &[[usize; 3]], bbox: BoundingBox) -> Self {
        // Roughly one triangle per bucket.
        let n = (triangles.len() as f64).sqrt().ceil() as usize;
        let ncols = n.max(1);
        let nrows = n.max(1);
        let mut buckets = vec![Vec::new(); ncols * nrows];

        let cell_w = bbox.width() / ncols as f64;
        let cell_h = bbox.height() / nrows as f64;

        for (ti, tri) in triangles.iter().enumerate() {
            let xs = tri.map(|i| nodes[i].0);
            let ys = tri.map(|i| nodes[i].1);
            let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let c0 = bucket_coord(min_x, bbox.min_lon, cell_w, ncols);
            let c1 = bucket_coord(max_x, bbox.min_lon, cell_w, ncols);
            let r0 = bucket_coord(min_y, bbox.min_lat, cell_h, nrows);
            let r1 = bucket_coord(max_y, bbox.min_lat, cell_h, nrows);
            for r in r0..=r1 {
                for c in c0..=c1 {
                    buckets[r * ncols + c].push(ti);
                }
            }
        }

        Self {
            bbox,
            ncols,
            nrows,
            buckets,
        }
    }

    /// Find the triangle enclosing a point and its barycentric weights.
    pub fn locate(
        &self,
        nodes: &[(f64, f64)],
        triangles: &[[usize; 3]],
        lon: f64,
        lat: f64,
    ) -> Option<(usize, [f64; 3])> {
        if !self.bbox.contains(lon, lat) {
            return None;
        }
        let cell_w = self.bbox.width() / self.ncols as f64;
        let cell_h = self.bbox.height() / self.nrows as f64;
        let c = bucket_coord(lon, self.bbox.min_lon, cell_w, self.ncols);
        let r = bucket_coord(lat, self.bbox.min_lat, cell_h, self.nrows);

        for &ti in &self.buckets[r * self.ncols + c] {
            let [a, b, cc] = triangles[ti];
            if let Some(w) = barycentric(nodes[a], nodes[b], nodes[cc], lon, lat) {
                return Some((ti, w));
            }
        }
        None
    }
}

fn bucket_coord(v: f64, min: f64, cell: f64, n: usize) -> usize {
    if cell <= 0.0 {
        return 0;
    }
    (((v - min) / cell).floor() as usize).min(n - 1)
}

fn nodes_bbox(nodes: &[(f64, f64)]) -> BoundingBox {
    let mut bb = BoundingBox::new(
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );
    for &(lon, lat) in nodes {
        bb.min_lon = bb.min_lon.min(lon);
        bb.min_lat = bb.min_lat.min(lat);
        bb.max_lon = bb.max_lon.max(lon);
        bb.max_lat = bb.max_lat.max(lat);
    }
    bb
}

fn signed_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1)) / 2.0
}

/// Barycentric weights of a point in a triangle, `None` if outside.
///
/// Small negative weights from floating-point noise on edges are
/// accepted and clamped.
pub fn barycentric(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    lon: f64,
    lat: f64,
) -> Option<[f64; 3]> {
    let area = signed_area(a, b, c);
    if area.abs() < MIN_TRIANGLE_AREA {
        return None;
    }
    let w0 = signed_area((lon, lat), b, c) / area;
    let w1 = signed_area(a, (lon, lat), c) / area;
    let w2 = signed_area(a, b, (lon, lat)) / area;
    let eps = -1e-12;
    if w0 >= eps && w1 >= eps && w2 >= eps {
        Some([w0.max(0.0), w1.max(0.0), w2.max(0.0)])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit square split into two triangles.
    fn square_mesh() -> UnstructuredMesh {
        UnstructuredMesh::load(
            "square",
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![true; 4],
            vec![false, true, true, false],
            Crs::Geographic,
        )
        .unwrap()
    }

    #[test]
    fn test_load_rejects_bad_connectivity() {
        let err = UnstructuredMesh::load(
            "bad",
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
            vec![[0, 1, 5]],
            vec![true; 3],
            vec![false; 3],
            Crs::Geographic,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConnectivity { node: 5, .. }));
    }

    #[test]
    fn test_load_rejects_degenerate_triangle() {
        let err = UnstructuredMesh::load(
            "bad",
            vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)],
            vec![[0, 1, 2]],
            vec![true; 3],
            vec![false; 3],
            Crs::Geographic,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::DegenerateTriangle(0)));
    }

    #[test]
    fn test_contains_and_locate() {
        let m = square_mesh();
        assert!(m.contains(0.75, 0.25));
        assert!(m.contains(0.25, 0.75));
        assert!(!m.contains(1.5, 0.5));

        let (ti, w) = m
            .index()
            .locate(m.nodes(), m.triangles(), 0.75, 0.25)
            .unwrap();
        assert_eq!(ti, 0);
        let sum: f64 = w.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_at_vertex() {
        let w = barycentric((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), 0.0, 0.0).unwrap();
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boundary_points_in_node_order() {
        let m = square_mesh();
        let pts = m.boundary_points();
        let nodes: Vec<usize> = pts.iter().map(|p| p.node).collect();
        assert_eq!(nodes, vec![1, 2]);
    }

    #[test]
    fn test_nearest_sea_node_skips_land() {
        let m = UnstructuredMesh::load(
            "m",
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![false, true, true, true],
            vec![false; 4],
            Crs::Geographic,
        )
        .unwrap();
        // Node 0 is closest but is land.
        assert_eq!(m.nearest_sea_node(-0.1, -0.1), Some(1));
    }
}
