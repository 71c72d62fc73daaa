//! Temporal resampling.
//!
//! Aligns a source series to the target model cadence. Values at an
//! existing source timestamp pass through unchanged; values between
//! source steps interpolate linearly; values beyond the ends take the
//! nearest endpoint and are flagged extrapolated. A hole in the source
//! wider than the configured maximum is an error for the affected
//! window, never silently bridged.

use chrono::{DateTime, Duration, Utc};

use wave_common::{ForcingField, Sample, Spectrum, TimeSeries};

use crate::error::{InterpolationError, Result};

/// Linear interpolation between two snapshots of the same shape.
///
/// `None` when the shapes disagree.
pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, w: f64) -> Option<Self>;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, w: f64) -> Option<Self> {
        Some(a * (1.0 - w) + b * w)
    }
}

impl Lerp for ForcingField {
    fn lerp(a: &Self, b: &Self, w: f64) -> Option<Self> {
        if a.width() != b.width() || a.height() != b.height() || a.is_vector() != b.is_vector() {
            return None;
        }
        let wf = w as f32;
        let u: Vec<f32> = a
            .u()
            .iter()
            .zip(b.u())
            .map(|(x, y)| x * (1.0 - wf) + y * wf)
            .collect();
        let out = match (a.v(), b.v()) {
            (Some(av), Some(bv)) => {
                let v: Vec<f32> = av
                    .iter()
                    .zip(bv)
                    .map(|(x, y)| x * (1.0 - wf) + y * wf)
                    .collect();
                ForcingField::vector(u, v, a.width(), a.height())
            }
            _ => ForcingField::scalar(u, a.width(), a.height()),
        };
        out.ok()
    }
}

/// Per-bin interpolation; both spectra must already be expressed on
/// the same (target) basis.
impl Lerp for Spectrum {
    fn lerp(a: &Self, b: &Self, w: f64) -> Option<Self> {
        if a.values().len() != b.values().len() || a.ndir() != b.ndir() {
            return None;
        }
        let energy: Vec<f64> = a
            .values()
            .iter()
            .zip(b.values())
            .map(|(x, y)| x * (1.0 - w) + y * w)
            .collect();
        Some(Spectrum::from_raw(energy, a.ndir()))
    }
}

/// Resample a series to explicit target timestamps.
///
/// Fails with [`InterpolationError::TemporalGap`] if any target falls
/// inside a source hole wider than `max_gap`.
pub fn resample<T: Lerp + Clone>(
    series: &TimeSeries<T>,
    targets: &[DateTime<Utc>],
    max_gap: Duration,
) -> Result<Vec<(DateTime<Utc>, Sample<T>)>> {
    if series.is_empty() {
        return Err(InterpolationError::EmptySeries);
    }

    let mut out = Vec::with_capacity(targets.len());
    for &t in targets {
        let (lower, upper) = series.bracket(t);
        let sample = match (lower, upper) {
            (Some(i), Some(j)) if i == j => {
                // Exact source timestamp: pass through unchanged.
                Sample::valid(series.get(i).unwrap().1.clone())
            }
            (Some(i), Some(j)) => {
                let (t0, a) = series.get(i).unwrap();
                let (t1, b) = series.get(j).unwrap();
                let gap = *t1 - *t0;
                if gap > max_gap {
                    return Err(InterpolationError::TemporalGap {
                        before: *t0,
                        after: *t1,
                        gap,
                        max_gap,
                    });
                }
                let w = (t - *t0).num_milliseconds() as f64
                    / gap.num_milliseconds() as f64;
                let v = T::lerp(a, b, w).ok_or(InterpolationError::ShapeMismatch)?;
                Sample::valid(v)
            }
            // Beyond an end of the series: nearest endpoint, flagged.
            (Some(i), None) => Sample::extrapolated(series.get(i).unwrap().1.clone()),
            (None, Some(j)) => Sample::extrapolated(series.get(j).unwrap().1.clone()),
            (None, None) => unreachable!("non-empty series always brackets"),
        };
        out.push((t, sample));
    }
    Ok(out)
}

/// Scalar convenience wrapper.
pub fn resample_scalar(
    series: &TimeSeries<f64>,
    targets: &[DateTime<Utc>],
    max_gap: Duration,
) -> Result<Vec<(DateTime<Utc>, Sample<f64>)>> {
    resample(series, targets, max_gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use wave_common::SampleFlag;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 25, h, 0, 0).unwrap()
    }

    fn series() -> TimeSeries<f64> {
        TimeSeries::from_pairs(vec![(t(0), 10.0), (t(3), 16.0), (t(6), 4.0)]).unwrap()
    }

    #[test]
    fn test_pass_through_at_source_timestamps() {
        let s = series();
        let out = resample_scalar(&s, &[t(0), t(3), t(6)], Duration::hours(6)).unwrap();
        assert_eq!(out[0].1.value, Some(10.0));
        assert_eq!(out[1].1.value, Some(16.0));
        assert_eq!(out[2].1.value, Some(4.0));
        assert!(out.iter().all(|(_, s)| s.flag == SampleFlag::Valid));
    }

    #[test]
    fn test_linear_between_brackets() {
        let s = series();
        let out = resample_scalar(&s, &[t(1), t(5)], Duration::hours(6)).unwrap();
        assert_relative_eq!(out[0].1.value.unwrap(), 12.0, epsilon = 1e-12);
        assert_relative_eq!(out[1].1.value.unwrap(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_endpoint_extrapolation_flagged() {
        let s = series();
        let out = resample_scalar(&s, &[t(8)], Duration::hours(6)).unwrap();
        assert_eq!(out[0].1.value, Some(4.0));
        assert_eq!(out[0].1.flag, SampleFlag::Extrapolated);

        let before = Utc.with_ymd_and_hms(2018, 8, 24, 22, 0, 0).unwrap();
        let out = resample_scalar(&s, &[before], Duration::hours(6)).unwrap();
        assert_eq!(out[0].1.value, Some(10.0));
        assert_eq!(out[0].1.flag, SampleFlag::Extrapolated);
    }

    #[test]
    fn test_gap_beyond_max_fails() {
        // 6-hour hole between 03 and 09.
        let s = TimeSeries::from_pairs(vec![(t(0), 1.0), (t(3), 2.0), (t(9), 3.0)]).unwrap();
        let err = resample_scalar(&s, &[t(5)], Duration::hours(3)).unwrap_err();
        match err {
            InterpolationError::TemporalGap { before, after, .. } => {
                assert_eq!(before, t(3));
                assert_eq!(after, t(9));
            }
            other => panic!("expected TemporalGap, got {other:?}"),
        }
        // Targets outside the hole are unaffected.
        let ok = resample_scalar(&s, &[t(1)], Duration::hours(3)).unwrap();
        assert_relative_eq!(ok[0].1.value.unwrap(), 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spectrum_lerp_per_bin() {
        let a = Spectrum::from_raw(vec![0.0, 2.0, 4.0, 6.0], 2);
        let b = Spectrum::from_raw(vec![4.0, 2.0, 0.0, 2.0], 2);
        let mid = Spectrum::lerp(&a, &b, 0.5).unwrap();
        assert_eq!(mid.values(), &[2.0, 2.0, 2.0, 4.0]);

        let wrong = Spectrum::from_raw(vec![1.0, 1.0], 2);
        assert!(Spectrum::lerp(&a, &wrong, 0.5).is_none());
    }

    #[test]
    fn test_field_lerp_shape_checked() {
        let a = ForcingField::scalar(vec![0.0; 4], 2, 2).unwrap();
        let b = ForcingField::scalar(vec![2.0; 4], 2, 2).unwrap();
        let mid = ForcingField::lerp(&a, &b, 0.25).unwrap();
        assert_eq!(mid.u()[0], 0.5);

        let c = ForcingField::scalar(vec![0.0; 6], 3, 2).unwrap();
        assert!(ForcingField::lerp(&a, &c, 0.5).is_none());
    }

    #[test]
    fn test_empty_series_rejected() {
        let s: TimeSeries<f64> = TimeSeries::new();
        assert!(matches!(
            resample_scalar(&s, &[t(0)], Duration::hours(1)),
            Err(InterpolationError::EmptySeries)
        ));
    }
}
