//! Spectral basis remapping.
//!
//! Remaps a 2-D wave spectrum onto a different frequency/direction
//! discretization. Frequencies interpolate linearly in log-frequency
//! (hindcast bases are geometrically spaced), directions interpolate
//! circularly with wraparound at 0/360°. The result is rescaled so the
//! zeroth moment, and with it the significant wave height, matches the
//! source value.

use serde::{Deserialize, Serialize};
use tracing::warn;

use wave_common::{Sample, SampleFlag, SpectralBasis, Spectrum};

/// Energy-conservation policy for spectral remapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemapOptions {
    /// Relative m0 drift (before rescaling) above which the output is
    /// flagged [`SampleFlag::EnergyMismatch`].
    pub tolerance: f64,
    /// Relative m0 drift above which the orchestrator drops the
    /// spectrum instead of keeping the flagged value.
    pub hard_cap: f64,
}

impl Default for RemapOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            hard_cap: 0.25,
        }
    }
}

/// Result of one spectral remap.
#[derive(Debug, Clone)]
pub struct RemapOutcome {
    pub spectrum: Spectrum,
    pub flag: SampleFlag,
    /// Relative m0 drift measured before rescaling.
    pub drift: f64,
}

impl RemapOutcome {
    /// Whether the drift exceeded the configured hard cap.
    pub fn beyond_cap(&self, opts: &RemapOptions) -> bool {
        self.drift > opts.hard_cap
    }

    pub fn into_sample(self) -> Sample<Spectrum> {
        Sample::flagged(self.spectrum, self.flag)
    }
}

/// Remap a spectrum from one basis to another.
///
/// A direction-convention mismatch between the bases is resolved by
/// rotating the source labels 180° before interpolating. Target bins
/// outside the source frequency range get zero energy.
pub fn remap(
    spectrum: &Spectrum,
    from: &SpectralBasis,
    to: &SpectralBasis,
    opts: &RemapOptions,
) -> RemapOutcome {
    // Normalize convention first; this is pure relabeling.
    let (src_basis, src_spectrum);
    if from.convention() != to.convention() {
        let (rotated, order) = from.rotated_convention();
        src_spectrum = spectrum.permute_dirs(&order);
        src_basis = rotated;
    } else {
        src_spectrum = spectrum.clone();
        src_basis = from.clone();
    }

    let m0_src = src_spectrum.m0(&src_basis);
    if m0_src == 0.0 {
        return RemapOutcome {
            spectrum: Spectrum::zeros(to),
            flag: SampleFlag::Valid,
            drift: 0.0,
        };
    }

    let mut energy = Vec::with_capacity(to.nbins());
    for &f in to.freqs() {
        let fw = log_freq_weights(src_basis.freqs(), f);
        for &d in to.dirs() {
            let dw = circular_dir_weights(src_basis.dirs(), d);
            let value = match (fw, dw) {
                (Some((i0, i1, wf)), (j0, j1, wd)) => {
                    let e00 = src_spectrum.get(i0, j0);
                    let e01 = src_spectrum.get(i0, j1);
                    let e10 = src_spectrum.get(i1, j0);
                    let e11 = src_spectrum.get(i1, j1);
                    let low = e00 * (1.0 - wd) + e01 * wd;
                    let high = e10 * (1.0 - wd) + e11 * wd;
                    low * (1.0 - wf) + high * wf
                }
                // Outside the source frequency range.
                (None, _) => 0.0,
            };
            energy.push(value);
        }
    }

    let mut out = Spectrum::from_raw(energy, to.ndir());
    let m0_raw = out.m0(to);
    let drift = (m0_raw - m0_src).abs() / m0_src;

    if m0_raw > 0.0 {
        out.scale(m0_src / m0_raw);
    }

    let flag = if m0_raw == 0.0 || drift > opts.tolerance {
        warn!(
            drift,
            tolerance = opts.tolerance,
            "spectral remap energy drift exceeds tolerance"
        );
        SampleFlag::EnergyMismatch
    } else {
        SampleFlag::Valid
    };

    RemapOutcome {
        spectrum: out,
        flag,
        // When no target bin received energy the drift is total.
        drift: if m0_raw == 0.0 { 1.0 } else { drift },
    }
}

/// Bracketing source frequency indices and the interpolation weight in
/// log-frequency space. `None` when `f` is outside the source range.
fn log_freq_weights(freqs: &[f64], f: f64) -> Option<(usize, usize, f64)> {
    let first = *freqs.first()?;
    let last = *freqs.last()?;
    if f < first || f > last {
        return None;
    }
    let i1 = freqs.partition_point(|&s| s < f);
    if i1 == 0 {
        return Some((0, 0, 0.0));
    }
    if freqs[i1] == f {
        return Some((i1, i1, 0.0));
    }
    let i0 = i1 - 1;
    let w = (f.ln() - freqs[i0].ln()) / (freqs[i1].ln() - freqs[i0].ln());
    Some((i0, i1, w))
}

/// Bracketing source direction indices and weight, wrapping at 0/360°.
fn circular_dir_weights(dirs: &[f64], d: f64) -> (usize, usize, f64) {
    let n = dirs.len();
    let d = d.rem_euclid(360.0);
    let j1 = dirs.partition_point(|&s| s < d);
    if j1 < n && dirs[j1] == d {
        return (j1, j1, 0.0);
    }
    if j1 == 0 || j1 == n {
        // Between the last and first bin, across north.
        let span = (dirs[0] + 360.0 - dirs[n - 1]).rem_euclid(360.0);
        let offset = (d - dirs[n - 1]).rem_euclid(360.0);
        if span == 0.0 {
            return (n - 1, n - 1, 0.0);
        }
        return (n - 1, 0, offset / span);
    }
    let j0 = j1 - 1;
    let w = (d - dirs[j0]) / (dirs[j1] - dirs[j0]);
    (j0, j1, w)
}
