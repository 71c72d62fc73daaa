//! Spectral discretization and 2-D wave spectra.
//!
//! A spectrum is wave energy density E(f, theta) in m²/Hz/deg on a
//! fixed frequency/direction discretization (the spectral basis).
//! Directions follow the nautical convention used by wave hindcasts:
//! degrees clockwise from north, either "coming from" or "going to"
//! depending on the declared convention.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing a spectral basis or spectrum.
#[derive(Debug, Error)]
pub enum BasisError {
    #[error("frequencies must be strictly increasing and positive (index {0})")]
    NonMonotonicFrequencies(usize),

    #[error("directions must be strictly increasing within [0, 360) (index {0})")]
    NonMonotonicDirections(usize),

    #[error("basis needs at least {min} {what} bins, got {got}")]
    TooFewBins {
        what: &'static str,
        min: usize,
        got: usize,
    },

    #[error("energy array has {got} values, basis has {expected} bins")]
    SizeMismatch { expected: usize, got: usize },
}

/// Whether direction bins denote where waves come from or travel to.
///
/// This is declared configuration, never inferred from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionConvention {
    /// Direction waves are coming from (meteorological, SWAN default).
    ComingFrom,
    /// Direction waves are propagating towards (oceanographic).
    GoingTo,
}

/// The frequency/direction discretization of a 2-D wave spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralBasis {
    freqs: Vec<f64>,
    dirs: Vec<f64>,
    convention: DirectionConvention,
}

impl SpectralBasis {
    /// Create a basis from explicit frequency and direction bins.
    ///
    /// Frequencies are Hz, strictly increasing and positive.
    /// Directions are degrees in `[0, 360)`, strictly increasing.
    pub fn new(
        freqs: Vec<f64>,
        dirs: Vec<f64>,
        convention: DirectionConvention,
    ) -> Result<Self, BasisError> {
        if freqs.len() < 2 {
            return Err(BasisError::TooFewBins {
                what: "frequency",
                min: 2,
                got: freqs.len(),
            });
        }
        if dirs.len() < 2 {
            return Err(BasisError::TooFewBins {
                what: "direction",
                min: 2,
                got: dirs.len(),
            });
        }
        for (i, w) in freqs.windows(2).enumerate() {
            if w[0] <= 0.0 || w[1] <= w[0] {
                return Err(BasisError::NonMonotonicFrequencies(i + 1));
            }
        }
        for (i, d) in dirs.iter().enumerate() {
            if !(0.0..360.0).contains(d) || (i > 0 && *d <= dirs[i - 1]) {
                return Err(BasisError::NonMonotonicDirections(i));
            }
        }
        Ok(Self {
            freqs,
            dirs,
            convention,
        })
    }

    /// Geometrically spaced frequencies `f0 * growth^i`, the spacing
    /// used by WAM-family hindcasts (growth typically 1.1).
    pub fn geometric(
        f0: f64,
        growth: f64,
        nfreq: usize,
        ndir: usize,
        convention: DirectionConvention,
    ) -> Result<Self, BasisError> {
        let freqs = (0..nfreq).map(|i| f0 * growth.powi(i as i32)).collect();
        let dirs = Self::regular_dirs(ndir);
        Self::new(freqs, dirs, convention)
    }

    /// Evenly spaced directions starting at 0°.
    pub fn regular_dirs(ndir: usize) -> Vec<f64> {
        let dd = 360.0 / ndir as f64;
        (0..ndir).map(|i| i as f64 * dd).collect()
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn dirs(&self) -> &[f64] {
        &self.dirs
    }

    pub fn convention(&self) -> DirectionConvention {
        self.convention
    }

    pub fn nfreq(&self) -> usize {
        self.freqs.len()
    }

    pub fn ndir(&self) -> usize {
        self.dirs.len()
    }

    /// Total number of (frequency, direction) bins.
    pub fn nbins(&self) -> usize {
        self.freqs.len() * self.dirs.len()
    }

    /// Frequency bin widths by the midpoint rule.
    ///
    /// Consistent with trapezoidal quadrature over the bin centers:
    /// interior widths span midpoint to midpoint, end bins get the
    /// half-interval to their single neighbour.
    pub fn freq_widths(&self) -> Vec<f64> {
        let n = self.freqs.len();
        let mut w = vec![0.0; n];
        w[0] = (self.freqs[1] - self.freqs[0]) / 2.0;
        w[n - 1] = (self.freqs[n - 1] - self.freqs[n - 2]) / 2.0;
        for i in 1..n - 1 {
            w[i] = (self.freqs[i + 1] - self.freqs[i - 1]) / 2.0;
        }
        w
    }

    /// Direction bin widths by the circular midpoint rule.
    ///
    /// Wraps around 0/360 so the widths always sum to 360°.
    pub fn dir_widths(&self) -> Vec<f64> {
        let n = self.dirs.len();
        let mut w = vec![0.0; n];
        for i in 0..n {
            let prev = self.dirs[(i + n - 1) % n];
            let next = self.dirs[(i + 1) % n];
            let up = (next - self.dirs[i]).rem_euclid(360.0);
            let down = (self.dirs[i] - prev).rem_euclid(360.0);
            w[i] = (up + down) / 2.0;
        }
        w
    }

    /// Same bins relabeled to the other convention (±180° rotation),
    /// re-sorted to keep directions monotonic.
    ///
    /// Returns the rotated basis and the permutation mapping new
    /// direction index -> old direction index, so spectrum columns can
    /// be reordered to match.
    pub fn rotated_convention(&self) -> (SpectralBasis, Vec<usize>) {
        let rotated: Vec<f64> = self.dirs.iter().map(|d| (d + 180.0) % 360.0).collect();
        let mut order: Vec<usize> = (0..rotated.len()).collect();
        order.sort_by(|&a, &b| rotated[a].partial_cmp(&rotated[b]).unwrap());
        let dirs: Vec<f64> = order.iter().map(|&i| rotated[i]).collect();
        let convention = match self.convention {
            DirectionConvention::ComingFrom => DirectionConvention::GoingTo,
            DirectionConvention::GoingTo => DirectionConvention::ComingFrom,
        };
        (
            SpectralBasis {
                freqs: self.freqs.clone(),
                dirs,
                convention,
            },
            order,
        )
    }
}

/// Energy density on a [`SpectralBasis`], one point in space and time.
///
/// Stored row-major over frequencies: `energy[ifreq * ndir + idir]`.
/// Non-negative by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    energy: Vec<f64>,
    ndir: usize,
}

impl Spectrum {
    /// Build a spectrum; negative densities are clamped to zero.
    pub fn new(energy: Vec<f64>, basis: &SpectralBasis) -> Result<Self, BasisError> {
        if energy.len() != basis.nbins() {
            return Err(BasisError::SizeMismatch {
                expected: basis.nbins(),
                got: energy.len(),
            });
        }
        let energy = energy.into_iter().map(|e| e.max(0.0)).collect();
        Ok(Self {
            energy,
            ndir: basis.ndir(),
        })
    }

    /// Build from raw energy values and a direction count, for callers
    /// that assembled the array bin by bin. Negatives clamp to zero.
    pub fn from_raw(energy: Vec<f64>, ndir: usize) -> Self {
        let energy = energy.into_iter().map(|e| e.max(0.0)).collect();
        Self { energy, ndir }
    }

    /// All-zero spectrum on the given basis.
    pub fn zeros(basis: &SpectralBasis) -> Self {
        Self {
            energy: vec![0.0; basis.nbins()],
            ndir: basis.ndir(),
        }
    }

    pub fn get(&self, ifreq: usize, idir: usize) -> f64 {
        self.energy[ifreq * self.ndir + idir]
    }

    pub fn values(&self) -> &[f64] {
        &self.energy
    }

    pub fn ndir(&self) -> usize {
        self.ndir
    }

    pub fn nfreq(&self) -> usize {
        if self.ndir == 0 {
            0
        } else {
            self.energy.len() / self.ndir
        }
    }

    pub fn is_zero(&self) -> bool {
        self.energy.iter().all(|&e| e == 0.0)
    }

    /// Zeroth spectral moment (total energy, m²) by bin-width quadrature.
    pub fn m0(&self, basis: &SpectralBasis) -> f64 {
        let df = basis.freq_widths();
        let dd = basis.dir_widths();
        let mut m0 = 0.0;
        for (i, dfi) in df.iter().enumerate() {
            for (j, ddj) in dd.iter().enumerate() {
                m0 += self.get(i, j) * dfi * ddj;
            }
        }
        m0
    }

    /// Significant wave height Hm0 = 4 sqrt(m0), metres.
    pub fn hs(&self, basis: &SpectralBasis) -> f64 {
        4.0 * self.m0(basis).sqrt()
    }

    /// Multiply every bin by a non-negative factor.
    pub fn scale(&mut self, factor: f64) {
        for e in &mut self.energy {
            *e *= factor;
        }
    }

    /// Reorder direction columns by the given permutation
    /// (new index -> old index), as produced by
    /// [`SpectralBasis::rotated_convention`].
    pub fn permute_dirs(&self, order: &[usize]) -> Spectrum {
        let nfreq = self.nfreq();
        let mut out = vec![0.0; self.energy.len()];
        for i in 0..nfreq {
            for (jnew, &jold) in order.iter().enumerate() {
                out[i * self.ndir + jnew] = self.get(i, jold);
            }
        }
        Spectrum {
            energy: out,
            ndir: self.ndir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn basis(nfreq: usize, ndir: usize) -> SpectralBasis {
        SpectralBasis::geometric(0.04, 1.1, nfreq, ndir, DirectionConvention::ComingFrom).unwrap()
    }

    #[test]
    fn test_rejects_bad_bins() {
        assert!(SpectralBasis::new(
            vec![0.1, 0.1, 0.2],
            SpectralBasis::regular_dirs(4),
            DirectionConvention::ComingFrom
        )
        .is_err());
        assert!(SpectralBasis::new(
            vec![0.1, 0.2],
            vec![0.0, 360.0],
            DirectionConvention::ComingFrom
        )
        .is_err());
    }

    #[test]
    fn test_dir_widths_sum_to_circle() {
        let b = basis(10, 12);
        let total: f64 = b.dir_widths().iter().sum();
        assert_relative_eq!(total, 360.0, epsilon = 1e-9);
        for w in b.dir_widths() {
            assert_relative_eq!(w, 30.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_freq_widths_cover_span() {
        let b = basis(16, 8);
        let total: f64 = b.freq_widths().iter().sum();
        let span = b.freqs()[15] - b.freqs()[0];
        assert_relative_eq!(total, span, epsilon = 1e-12);
    }

    #[test]
    fn test_spectrum_clamps_negative() {
        let b = basis(2, 2);
        let s = Spectrum::new(vec![1.0, -0.5, 0.25, 0.0], &b).unwrap();
        assert_eq!(s.get(0, 1), 0.0);
        assert_eq!(s.get(1, 0), 0.25);
    }

    #[test]
    fn test_m0_uniform_density() {
        // Constant density integrates to density * freq span * 360.
        let b = basis(10, 16);
        let s = Spectrum::new(vec![0.001; b.nbins()], &b).unwrap();
        let span = b.freqs()[9] - b.freqs()[0];
        assert_relative_eq!(s.m0(&b), 0.001 * span * 360.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_convention_roundtrip_energy() {
        let b = SpectralBasis::new(
            vec![0.05, 0.1, 0.2],
            vec![0.0, 90.0, 180.0, 270.0],
            DirectionConvention::ComingFrom,
        )
        .unwrap();
        let mut energy = vec![0.0; b.nbins()];
        energy[1] = 2.0; // f=0.05, dir=90
        let s = Spectrum::new(energy, &b).unwrap();

        let (rb, order) = b.rotated_convention();
        assert_eq!(rb.convention(), DirectionConvention::GoingTo);
        let rs = s.permute_dirs(&order);

        // Energy that sat at 90° coming-from now sits at 270° going-to.
        let j270 = rb.dirs().iter().position(|&d| d == 270.0).unwrap();
        assert_eq!(rs.get(0, j270), 2.0);
        assert_relative_eq!(rs.m0(&rb), s.m0(&b), epsilon = 1e-12);
    }

    #[test]
    fn test_permute_dirs_is_involution_with_double_rotation() {
        let b = basis(3, 8);
        let vals: Vec<f64> = (0..b.nbins()).map(|i| i as f64).collect();
        let s = Spectrum::new(vals, &b).unwrap();
        let (rb, order) = b.rotated_convention();
        let (_, order2) = rb.rotated_convention();
        let back = s.permute_dirs(&order).permute_dirs(&order2);
        assert_eq!(back, s);
    }
}
