//! SWAN ASCII spectral boundary file writer.
//!
//! Produces the "Swan standard spectral file" layout: a header
//! declaring locations, frequencies and directions, then one block per
//! timestep with a FACTOR record and scaled integer variance densities
//! per location. Locations without data get a NODATA record, which is
//! how missing values stay visible to the downstream model.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use wave_common::{Sample, SpectralBasis, Spectrum};

use crate::atomic::write_atomic;
use crate::error::{FormatError, Result};
use crate::SWAN_TIME_FORMAT;

/// Largest integer written for a density value; the per-spectrum
/// FACTOR is chosen so the peak maps to this.
const DENSITY_SCALE_MAX: f64 = 990_000.0;

/// Writer for SWAN ASCII spectral boundary files.
#[derive(Debug, Clone, Default)]
pub struct SwanSpecWriter;

impl SwanSpecWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a boundary spectra series to `path` atomically.
    ///
    /// `series` holds, per timestep, one sample per location in the
    /// same order as `locations`.
    pub fn write(
        &self,
        basis: &SpectralBasis,
        locations: &[(f64, f64)],
        series: &[(DateTime<Utc>, Vec<Sample<Spectrum>>)],
        path: &Path,
    ) -> Result<PathBuf> {
        if series.is_empty() || locations.is_empty() {
            return Err(FormatError::EmptySeries);
        }

        let out = write_atomic(path, |w| {
            write_header(w, basis, locations)?;
            for (t, samples) in series {
                if samples.len() != locations.len() {
                    return Err(FormatError::LocationCountMismatch {
                        expected: locations.len(),
                        got: samples.len(),
                    });
                }
                writeln!(
                    w,
                    "{}                         date and time",
                    t.format(SWAN_TIME_FORMAT)
                )?;
                for sample in samples {
                    match &sample.value {
                        Some(spectrum) => write_spectrum(w, basis, spectrum)?,
                        None => writeln!(w, "NODATA")?,
                    }
                }
            }
            Ok(())
        })?;

        info!(
            path = %out.display(),
            steps = series.len(),
            locations = locations.len(),
            "wrote SWAN boundary spectra"
        );
        Ok(out)
    }
}

fn write_header(
    w: &mut dyn Write,
    basis: &SpectralBasis,
    locations: &[(f64, f64)],
) -> Result<()> {
    writeln!(
        w,
        "SWAN   1                                Swan standard spectral file, version"
    )?;
    writeln!(w, "$   Data produced by wave-downscale")?;
    writeln!(w, "TIME                                    time-dependent data")?;
    writeln!(w, "     1                                  time coding option")?;
    writeln!(
        w,
        "LONLAT                                  locations in spherical coordinates"
    )?;
    writeln!(
        w,
        "{:6}                                  number of locations",
        locations.len()
    )?;
    for &(lon, lat) in locations {
        writeln!(w, "{lon:12.6} {lat:12.6}")?;
    }

    writeln!(
        w,
        "AFREQ                                   absolute frequencies in Hz"
    )?;
    writeln!(
        w,
        "{:6}                                  number of frequencies",
        basis.nfreq()
    )?;
    for &f in basis.freqs() {
        if f <= 0.0 {
            return Err(FormatError::Unrepresentable {
                what: "frequency",
                value: f,
            });
        }
        writeln!(w, "{f:10.4}")?;
    }

    writeln!(
        w,
        "NDIR                                    spectral nautical directions in degr"
    )?;
    writeln!(
        w,
        "{:6}                                  number of directions",
        basis.ndir()
    )?;
    for &d in basis.dirs() {
        writeln!(w, "{d:10.4}")?;
    }

    writeln!(w, "QUANT")?;
    writeln!(
        w,
        "     1                                  number of quantities in table"
    )?;
    writeln!(
        w,
        "VaDens                                  variance densities in m2/Hz/degr"
    )?;
    writeln!(w, "m2/Hz/degr                              unit")?;
    writeln!(
        w,
        "   -0.9900E+02                          exception value"
    )?;
    Ok(())
}

fn write_spectrum(w: &mut dyn Write, basis: &SpectralBasis, spectrum: &Spectrum) -> Result<()> {
    if spectrum.values().len() != basis.nbins() {
        return Err(FormatError::BinCountMismatch {
            expected: basis.nbins(),
            got: spectrum.values().len(),
        });
    }
    let max = spectrum.values().iter().cloned().fold(0.0f64, f64::max);
    if !max.is_finite() {
        return Err(FormatError::Unrepresentable {
            what: "variance density",
            value: max,
        });
    }
    let factor = if max > 0.0 { max / DENSITY_SCALE_MAX } else { 1.0 };

    writeln!(w, "FACTOR")?;
    writeln!(w, "{factor:18.8E}")?;
    for i in 0..basis.nfreq() {
        let mut line = String::with_capacity(basis.ndir() * 8);
        for j in 0..basis.ndir() {
            let scaled = (spectrum.get(i, j) / factor).round() as i64;
            if j > 0 {
                line.push(' ');
            }
            line.push_str(&format!("{scaled:6}"));
        }
        writeln!(w, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wave_common::DirectionConvention;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 25, h, 0, 0).unwrap()
    }

    fn basis() -> SpectralBasis {
        SpectralBasis::new(
            vec![0.05, 0.1, 0.2],
            vec![0.0, 90.0, 180.0, 270.0],
            DirectionConvention::ComingFrom,
        )
        .unwrap()
    }

    fn sample(peak: f64, basis: &SpectralBasis) -> Sample<Spectrum> {
        let mut energy = vec![0.0; basis.nbins()];
        energy[5] = peak;
        energy[6] = peak / 2.0;
        Sample::valid(Spectrum::new(energy, basis).unwrap())
    }

    #[test]
    fn test_header_and_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.bnd");
        let b = basis();
        let locations = vec![(4.5, 60.6), (5.0, 61.0)];
        let series = vec![
            (t(0), vec![sample(0.9, &b), Sample::no_data()]),
            (t(3), vec![sample(1.1, &b), sample(0.2, &b)]),
        ];
        SwanSpecWriter::new()
            .write(&b, &locations, &series, &path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("SWAN   1"));
        assert!(text.contains("LONLAT"));
        assert!(text.contains("AFREQ"));
        assert!(text.contains("NDIR"));
        assert!(text.contains("VaDens"));
        assert!(text.contains("20180825.000000"));
        assert!(text.contains("20180825.030000"));
        // One NODATA marker for the missing first-step sample.
        assert_eq!(text.matches("NODATA").count(), 1);
        // Peak bin maps to the integer ceiling of the scale.
        assert!(text.contains("990000"));
        assert!(text.contains("495000"));
    }

    #[test]
    fn test_bin_count_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.bnd");
        let b = basis();
        let wrong = Sample::valid(Spectrum::from_raw(vec![1.0; 4], 2));
        let err = SwanSpecWriter::new()
            .write(&b, &[(4.5, 60.6)], &[(t(0), vec![wrong])], &path)
            .unwrap_err();
        assert!(matches!(err, FormatError::BinCountMismatch { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_location_count_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.bnd");
        let b = basis();
        let err = SwanSpecWriter::new()
            .write(
                &b,
                &[(4.5, 60.6), (5.0, 61.0)],
                &[(t(0), vec![sample(1.0, &b)])],
                &path,
            )
            .unwrap_err();
        assert!(matches!(err, FormatError::LocationCountMismatch { .. }));
    }

    #[test]
    fn test_byte_identical_reruns() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bnd");
        let c = dir.path().join("b.bnd");
        let b = basis();
        let locations = vec![(4.5, 60.6)];
        let series = vec![(t(0), vec![sample(0.7, &b)])];
        SwanSpecWriter::new().write(&b, &locations, &series, &a).unwrap();
        SwanSpecWriter::new().write(&b, &locations, &series, &c).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&c).unwrap());
    }
}
