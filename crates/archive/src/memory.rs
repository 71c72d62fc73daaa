//! In-process archive implementation.
//!
//! Holds a complete dataset in memory. Used by tests and by callers
//! that already have the source data loaded through some other path.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use domain::{Crs, StructuredGrid};
use wave_common::{
    BoundingBox, DirectionConvention, ForcingField, SpectralBasis, Spectrum, TimeRange,
};

use crate::error::{CoverageError, Result};
use crate::source::{ArchiveMeta, SourceArchive, SpectraBatch, WindBatch};

/// A [`SourceArchive`] backed by in-memory arrays.
pub struct InMemoryArchive {
    meta: ArchiveMeta,
    grid: StructuredGrid,
    /// Full-grid wind fields per timestep.
    wind: Vec<(DateTime<Utc>, ForcingField)>,
    basis: SpectralBasis,
    /// Per timestep, one spectrum per grid node (row-major).
    spectra: Vec<(DateTime<Utc>, Vec<Spectrum>)>,
}

impl InMemoryArchive {
    pub fn new(
        meta: ArchiveMeta,
        grid: StructuredGrid,
        wind: Vec<(DateTime<Utc>, ForcingField)>,
        basis: SpectralBasis,
        spectra: Vec<(DateTime<Utc>, Vec<Spectrum>)>,
    ) -> Self {
        Self {
            meta,
            grid,
            wind,
            basis,
            spectra,
        }
    }

    /// A deterministic all-sea test archive on an 11x11 node grid.
    ///
    /// Wind is uniform in space with u ramping linearly in time; every
    /// sea node carries the same swell-like spectrum, so downstream
    /// interpolation results are easy to verify analytically.
    pub fn uniform_test_archive(
        name: &str,
        bbox: BoundingBox,
        time_range: TimeRange,
        time_step: Duration,
    ) -> Self {
        let nx = 11;
        let ny = 11;
        let grid = StructuredGrid::new(
            name,
            bbox.min_lon,
            bbox.min_lat,
            bbox.width() / (nx - 1) as f64,
            bbox.height() / (ny - 1) as f64,
            nx,
            ny,
            vec![true; nx * ny],
            Crs::Geographic,
        )
        .expect("test grid is valid");

        let basis =
            SpectralBasis::geometric(0.04, 1.1, 20, 12, DirectionConvention::ComingFrom)
                .expect("test basis is valid");
        let spectrum = swell_spectrum(&basis, 0.1, 210.0, 2.0);

        let times = time_range.steps(time_step);
        let wind = times
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let u = vec![5.0 + 0.5 * i as f32; nx * ny];
                let v = vec![-2.0; nx * ny];
                (t, ForcingField::vector(u, v, nx, ny).unwrap())
            })
            .collect();
        let spectra = times
            .iter()
            .map(|&t| (t, vec![spectrum.clone(); nx * ny]))
            .collect();

        let meta = ArchiveMeta {
            name: name.to_string(),
            bbox,
            time_range,
            time_step,
        };
        Self::new(meta, grid, wind, basis, spectra)
    }

    /// Drop the timesteps inside `gap` from both variables. Used to
    /// simulate missing hindcast hours.
    pub fn with_gap(mut self, gap: TimeRange) -> Self {
        self.wind.retain(|(t, _)| !gap.contains(*t));
        self.spectra.retain(|(t, _)| !gap.contains(*t));
        self
    }

    pub fn grid(&self) -> &StructuredGrid {
        &self.grid
    }

    pub fn basis(&self) -> &SpectralBasis {
        &self.basis
    }

    /// Grid node index ranges (cols, rows) whose nodes fall in `bbox`.
    fn subset_ranges(&self, bbox: &BoundingBox) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let mut cols = None;
        let mut rows = None;
        for col in 0..self.grid.nx() {
            let (lon, _) = self.grid.node_position(col, 0);
            if lon >= bbox.min_lon && lon <= bbox.max_lon {
                let r = cols.get_or_insert(col..col + 1);
                r.end = col + 1;
            }
        }
        for row in 0..self.grid.ny() {
            let (_, lat) = self.grid.node_position(0, row);
            if lat >= bbox.min_lat && lat <= bbox.max_lat {
                let r = rows.get_or_insert(row..row + 1);
                r.end = row + 1;
            }
        }
        match (cols, rows) {
            (Some(c), Some(r)) if c.len() >= 2 && r.len() >= 2 => Some((c, r)),
            _ => None,
        }
    }

    fn subgrid(&self, cols: &std::ops::Range<usize>, rows: &std::ops::Range<usize>) -> StructuredGrid {
        let (lon0, lat0) = self.grid.node_position(cols.start, rows.start);
        let mut mask = Vec::with_capacity(cols.len() * rows.len());
        for row in rows.clone() {
            for col in cols.clone() {
                mask.push(self.grid.is_sea(col, row));
            }
        }
        StructuredGrid::new(
            self.grid.name(),
            lon0,
            lat0,
            self.grid.dlon(),
            self.grid.dlat(),
            cols.len(),
            rows.len(),
            mask,
            self.grid.crs(),
        )
        .expect("subgrid of a valid grid is valid")
    }
}

#[async_trait]
impl SourceArchive for InMemoryArchive {
    fn meta(&self) -> &ArchiveMeta {
        &self.meta
    }

    async fn fetch_wind(&self, bbox: BoundingBox, window: TimeRange) -> Result<WindBatch> {
        let (cols, rows) = self
            .subset_ranges(&bbox)
            .ok_or(CoverageError::DisjointArea {
                requested: bbox,
                coverage: self.meta.bbox,
            })?;
        let grid = self.subgrid(&cols, &rows);

        let steps = self
            .wind
            .iter()
            .filter(|(t, _)| window.contains(*t))
            .map(|(t, field)| {
                let mut u = Vec::with_capacity(cols.len() * rows.len());
                let mut v = Vec::with_capacity(cols.len() * rows.len());
                for row in rows.clone() {
                    for col in cols.clone() {
                        u.push(field.get_u(col, row).unwrap());
                        v.push(field.get_v(col, row).unwrap());
                    }
                }
                let sub = ForcingField::vector(u, v, cols.len(), rows.len()).unwrap();
                (*t, sub)
            })
            .collect();

        Ok(WindBatch { grid, steps })
    }

    async fn fetch_spectra(&self, bbox: BoundingBox, window: TimeRange) -> Result<SpectraBatch> {
        let (cols, rows) = self
            .subset_ranges(&bbox)
            .ok_or(CoverageError::DisjointArea {
                requested: bbox,
                coverage: self.meta.bbox,
            })?;

        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for row in rows.clone() {
            for col in cols.clone() {
                if self.grid.is_sea(col, row) {
                    positions.push(self.grid.node_position(col, row));
                    indices.push(row * self.grid.nx() + col);
                }
            }
        }

        let steps = self
            .spectra
            .iter()
            .filter(|(t, _)| window.contains(*t))
            .map(|(t, all)| (*t, indices.iter().map(|&i| all[i].clone()).collect()))
            .collect();

        Ok(SpectraBatch {
            basis: self.basis.clone(),
            positions,
            steps,
        })
    }
}

/// A swell-like spectrum: Gaussian in log-frequency around `fp`,
/// cosine-squared directional spreading around `peak_dir`, scaled so
/// Hs comes out near `hs_target`.
pub fn swell_spectrum(basis: &SpectralBasis, fp: f64, peak_dir: f64, hs_target: f64) -> Spectrum {
    let sigma: f64 = 0.3; // width in ln(f)
    let mut energy = Vec::with_capacity(basis.nbins());
    for &f in basis.freqs() {
        let shape = (-(f.ln() - fp.ln()).powi(2) / (2.0 * sigma * sigma)).exp();
        for &d in basis.dirs() {
            let mut delta = (d - peak_dir).abs() % 360.0;
            if delta > 180.0 {
                delta = 360.0 - delta;
            }
            let spread = if delta < 90.0 {
                delta.to_radians().cos().powi(2)
            } else {
                0.0
            };
            energy.push(shape * spread);
        }
    }
    let mut spectrum = Spectrum::new(energy, basis).expect("basis-sized energy array");
    let m0 = spectrum.m0(basis);
    if m0 > 0.0 {
        let target_m0 = (hs_target / 4.0).powi(2);
        spectrum.scale(target_m0 / m0);
    }
    spectrum
}
