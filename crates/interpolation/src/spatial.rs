//! Spatial interpolation from source domains to target points.
//!
//! Grids use bilinear interpolation over the enclosing cell, meshes
//! barycentric interpolation over the enclosing triangle. Both handle
//! land the same way: the weight of a masked (or NaN) vertex is
//! redistributed proportionally over the remaining valid vertices; if
//! every vertex is masked the result is no-data, never zero. Points
//! outside the source domain fall back to the nearest valid source
//! node and are flagged extrapolated.

use domain::{Domain, StructuredGrid, UnstructuredMesh};
use wave_common::{Sample, Spectrum};

use crate::error::{InterpolationError, Result};

/// Bilinear interpolation of node values at one point.
///
/// `values` holds one value per grid node, row-major, row 0 = south.
pub fn bilinear_at(grid: &StructuredGrid, values: &[f64], lon: f64, lat: f64) -> Sample<f64> {
    debug_assert_eq!(values.len(), grid.node_count());

    let Some(cell) = grid.locate_cell(lon, lat) else {
        return nearest_valid(grid.nearest_sea_node(lon, lat), values);
    };

    let nx = grid.nx();
    let corners = [
        (cell.col, cell.row, (1.0 - cell.fx) * (1.0 - cell.fy)),
        (cell.col + 1, cell.row, cell.fx * (1.0 - cell.fy)),
        (cell.col, cell.row + 1, (1.0 - cell.fx) * cell.fy),
        (cell.col + 1, cell.row + 1, cell.fx * cell.fy),
    ];

    let mut acc = 0.0;
    let mut weight_sum = 0.0;
    for (col, row, w) in corners {
        let idx = row * nx + col;
        let v = values[idx];
        if grid.is_sea(col, row) && v.is_finite() {
            acc += w * v;
            weight_sum += w;
        }
    }

    if weight_sum <= 0.0 {
        // Entire enclosing cell is land.
        return Sample::no_data();
    }
    Sample::valid(acc / weight_sum)
}

/// Barycentric interpolation of node values at one point.
pub fn barycentric_at(mesh: &UnstructuredMesh, values: &[f64], lon: f64, lat: f64) -> Sample<f64> {
    debug_assert_eq!(values.len(), mesh.node_count());

    let located = mesh.index().locate(mesh.nodes(), mesh.triangles(), lon, lat);
    let Some((ti, weights)) = located else {
        return nearest_valid(mesh.nearest_sea_node(lon, lat), values);
    };

    let tri = mesh.triangles()[ti];
    let mut acc = 0.0;
    let mut weight_sum = 0.0;
    for (k, &node) in tri.iter().enumerate() {
        let v = values[node];
        if mesh.is_sea(node) && v.is_finite() {
            acc += weights[k] * v;
            weight_sum += weights[k];
        }
    }

    if weight_sum <= 0.0 {
        return Sample::no_data();
    }
    Sample::valid(acc / weight_sum)
}

fn nearest_valid(node: Option<usize>, values: &[f64]) -> Sample<f64> {
    match node {
        Some(idx) if values[idx].is_finite() => Sample::extrapolated(values[idx]),
        _ => Sample::no_data(),
    }
}

/// Interpolate a node-value field to a list of target points.
pub fn interpolate_field(
    source: &Domain,
    values: &[f64],
    targets: &[(f64, f64)],
) -> Result<Vec<Sample<f64>>> {
    if values.len() != source.node_count() {
        return Err(InterpolationError::ValueCount {
            expected: source.node_count(),
            got: values.len(),
        });
    }
    let out = targets
        .iter()
        .map(|&(lon, lat)| match source {
            Domain::Structured(g) => bilinear_at(g, values, lon, lat),
            Domain::Unstructured(m) => barycentric_at(m, values, lon, lat),
        })
        .collect();
    Ok(out)
}

/// Pick the source spectrum nearest to a target point.
///
/// Boundary spectra are taken from the closest archive output point
/// rather than mixed across points, so the spectral shape stays
/// physical. Ties resolve to the lowest position index. Returns the
/// chosen index; the caller decides whether "nearest" also means
/// "outside coverage" and flags accordingly.
pub fn nearest_spectrum(positions: &[(f64, f64)], lon: f64, lat: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &(plon, plat)) in positions.iter().enumerate() {
        let d2 = (plon - lon).powi(2) + (plat - lat).powi(2);
        if best.map_or(true, |(_, bd)| d2 < bd) {
            best = Some((i, d2));
        }
    }
    best.map(|(i, _)| i)
}

/// Interpolate per-node spectra to target points bin by bin, using
/// the same spatial weights as scalar interpolation.
///
/// All spectra must share one basis; missing output is `None`.
pub fn interpolate_spectra(
    source: &Domain,
    spectra: &[Spectrum],
    targets: &[(f64, f64)],
) -> Result<Vec<Sample<Spectrum>>> {
    if spectra.len() != source.node_count() {
        return Err(InterpolationError::ValueCount {
            expected: source.node_count(),
            got: spectra.len(),
        });
    }
    let Some(first) = spectra.first() else {
        return Err(InterpolationError::EmptySeries);
    };
    let nbins = first.values().len();
    if spectra.iter().any(|s| s.values().len() != nbins) {
        return Err(InterpolationError::ShapeMismatch);
    }
    let ndir = first.ndir();

    let mut out = Vec::with_capacity(targets.len());
    for &(lon, lat) in targets {
        let mut energy = vec![0.0; nbins];
        let mut flag = None;
        let mut no_data = false;
        for bin in 0..nbins {
            let values: Vec<f64> = spectra.iter().map(|s| s.values()[bin]).collect();
            let sample = match source {
                Domain::Structured(g) => bilinear_at(g, &values, lon, lat),
                Domain::Unstructured(m) => barycentric_at(m, &values, lon, lat),
            };
            match sample.value {
                Some(v) => energy[bin] = v,
                None => {
                    no_data = true;
                    break;
                }
            }
            flag.get_or_insert(sample.flag);
        }
        if no_data {
            out.push(Sample::no_data());
        } else {
            let spectrum = Spectrum::from_raw(energy, ndir);
            out.push(Sample::flagged(
                spectrum,
                flag.unwrap_or(wave_common::SampleFlag::Valid),
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use domain::{Crs, EdgeSelection};
    use wave_common::SampleFlag;

    fn grid_3x3(mask: Vec<bool>) -> StructuredGrid {
        StructuredGrid::new("g", 0.0, 0.0, 1.0, 1.0, 3, 3, mask, Crs::Geographic).unwrap()
    }

    #[test]
    fn test_bilinear_exact_at_nodes() {
        let g = grid_3x3(vec![true; 9]);
        let values: Vec<f64> = (0..9).map(|i| i as f64).collect();
        for row in 0..3 {
            for col in 0..3 {
                let (lon, lat) = g.node_position(col, row);
                let s = bilinear_at(&g, &values, lon, lat);
                assert_eq!(s.value, Some((row * 3 + col) as f64));
                assert_eq!(s.flag, SampleFlag::Valid);
            }
        }
    }

    #[test]
    fn test_bilinear_bounded_by_cell_vertices() {
        let g = grid_3x3(vec![true; 9]);
        let values = vec![1.0, 4.0, 2.0, 3.0, 8.0, 5.0, 2.0, 6.0, 7.0];
        // Points strictly inside the SW cell (nodes 0,1,3,4).
        for &(lon, lat) in &[(0.3, 0.4), (0.9, 0.1), (0.5, 0.5), (0.01, 0.99)] {
            let v = bilinear_at(&g, &values, lon, lat).value.unwrap();
            assert!(v >= 1.0 && v <= 8.0, "value {v} out of vertex bounds");
        }
    }

    #[test]
    fn test_masked_vertex_weight_redistributed() {
        let mut mask = vec![true; 9];
        mask[0] = false; // SW corner is land
        let g = grid_3x3(mask);
        let values: Vec<f64> = vec![100.0, 2.0, 0.0, 4.0, 6.0, 0.0, 0.0, 0.0, 0.0];
        // Cell center: equal weights over the three valid vertices.
        let v = bilinear_at(&g, &values, 0.5, 0.5).value.unwrap();
        assert_relative_eq!(v, (2.0 + 4.0 + 6.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_all_masked_cell_is_no_data() {
        let mask = vec![false, false, true, false, false, true, true, true, true];
        let g = grid_3x3(mask);
        let values = vec![1.0; 9];
        let s = bilinear_at(&g, &values, 0.5, 0.5);
        assert!(s.is_no_data());
    }

    #[test]
    fn test_outside_point_extrapolates_nearest() {
        let g = grid_3x3(vec![true; 9]);
        let values: Vec<f64> = (0..9).map(|i| i as f64 * 10.0).collect();
        let s = bilinear_at(&g, &values, -1.0, -1.0);
        assert_eq!(s.value, Some(0.0));
        assert_eq!(s.flag, SampleFlag::Extrapolated);
    }

    #[test]
    fn test_barycentric_linear_function_reproduced() {
        // f(lon, lat) = 2 lon + 3 lat is exactly representable.
        let m = UnstructuredMesh::load(
            "m",
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![true; 4],
            vec![false; 4],
            Crs::Geographic,
        )
        .unwrap();
        let values: Vec<f64> = m.nodes().iter().map(|&(x, y)| 2.0 * x + 3.0 * y).collect();
        for &(x, y) in &[(0.5, 0.2), (0.8, 0.9), (0.25, 0.25)] {
            let s = barycentric_at(&m, &values, x, y);
            assert_relative_eq!(s.value.unwrap(), 2.0 * x + 3.0 * y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mesh_outside_falls_back_to_nearest_sea() {
        let m = UnstructuredMesh::load(
            "m",
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![false, true, true, true],
            vec![false; 4],
            Crs::Geographic,
        )
        .unwrap();
        let values = vec![9.0, 1.0, 2.0, 3.0];
        let s = barycentric_at(&m, &values, -0.5, -0.5);
        // Node 0 is nearest but land; node 1 wins.
        assert_eq!(s.value, Some(1.0));
        assert_eq!(s.flag, SampleFlag::Extrapolated);
    }

    #[test]
    fn test_interpolate_field_rejects_bad_count() {
        let g = grid_3x3(vec![true; 9]);
        let d = Domain::Structured(g);
        let err = interpolate_field(&d, &[1.0; 4], &[(0.5, 0.5)]).unwrap_err();
        assert!(matches!(err, InterpolationError::ValueCount { .. }));
    }

    #[test]
    fn test_interpolate_field_at_boundary_points() {
        let g = grid_3x3(vec![true; 9]);
        let pts = g.boundary_points(&EdgeSelection::all());
        let d = Domain::Structured(g);
        let values = vec![2.5; 9];
        let samples = interpolate_field(&d, &values, &pts.positions()).unwrap();
        assert_eq!(samples.len(), 8);
        for s in samples {
            assert_eq!(s.value, Some(2.5));
        }
    }

    #[test]
    fn test_nearest_spectrum_tie_breaks_low_index() {
        let positions = vec![(0.0, 0.0), (2.0, 0.0)];
        assert_eq!(nearest_spectrum(&positions, 1.0, 0.0), Some(0));
        assert_eq!(nearest_spectrum(&positions, 1.5, 0.0), Some(1));
        assert_eq!(nearest_spectrum(&[], 0.0, 0.0), None);
    }
}
