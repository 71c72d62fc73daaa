//! SWAN ASCII wind forcing writer.
//!
//! Layout per timestep, exactly as SWAN's `READINP WIND` expects with
//! a factor of 0.001: a `yyyymmdd.HHMMSS` stamp, the u component as
//! whole numbers (m/s scaled by 1000), the stamp again, then v. Rows
//! run south to north, values west to east.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use wave_common::ForcingField;

use crate::atomic::write_atomic;
use crate::error::{FormatError, Result};
use crate::SWAN_TIME_FORMAT;

/// Scaling applied to wind speeds before integer formatting.
const WIND_SCALE: f64 = 1000.0;

/// Writer for SWAN ASCII wind forcing files.
#[derive(Debug, Clone, Default)]
pub struct SwanWindWriter;

impl SwanWindWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a wind series to `path` atomically.
    ///
    /// Every snapshot must be a vector field of the same shape.
    pub fn write(
        &self,
        series: &[(DateTime<Utc>, ForcingField)],
        path: &Path,
    ) -> Result<PathBuf> {
        let Some((_, first)) = series.first() else {
            return Err(FormatError::EmptySeries);
        };
        let (width, height) = (first.width(), first.height());

        let out = write_atomic(path, |w| {
            for (t, field) in series {
                if !field.is_vector() {
                    return Err(FormatError::NotVector);
                }
                if field.width() != width || field.height() != height {
                    return Err(FormatError::ShapeChanged(format!(
                        "expected {width}x{height}, got {}x{}",
                        field.width(),
                        field.height()
                    )));
                }
                let stamp = t.format(SWAN_TIME_FORMAT).to_string();
                writeln!(w, "{stamp}")?;
                write_component(w, field.u(), width)?;
                writeln!(w, "{stamp}")?;
                write_component(w, field.v().expect("checked vector"), width)?;
            }
            Ok(())
        })?;

        info!(
            path = %out.display(),
            steps = series.len(),
            "wrote SWAN wind forcing"
        );
        Ok(out)
    }
}

fn write_component(w: &mut dyn Write, values: &[f32], width: usize) -> Result<()> {
    for row in values.chunks(width) {
        let mut line = String::with_capacity(row.len() * 6);
        for (i, &v) in row.iter().enumerate() {
            let scaled = v as f64 * WIND_SCALE;
            if !scaled.is_finite() || scaled.abs() > i32::MAX as f64 {
                return Err(FormatError::Unrepresentable {
                    what: "wind speed",
                    value: v as f64,
                });
            }
            if i > 0 {
                line.push(' ');
            }
            // Truncation toward zero matches the reference tooling.
            line.push_str(&(scaled as i64).to_string());
        }
        writeln!(w, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 25, h, 0, 0).unwrap()
    }

    fn field(u: f32, v: f32) -> ForcingField {
        ForcingField::vector(vec![u; 6], vec![v; 6], 3, 2).unwrap()
    }

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.asc");
        let series = vec![(t(0), field(5.5, -2.25)), (t(3), field(6.0, 0.0))];
        SwanWindWriter::new().write(&series, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 * (1 + 2 + 1 + 2));
        assert_eq!(lines[0], "20180825.000000");
        assert_eq!(lines[1], "5500 5500 5500");
        assert_eq!(lines[3], "20180825.000000");
        assert_eq!(lines[4], "-2250 -2250 -2250");
        assert_eq!(lines[6], "20180825.030000");
        assert_eq!(lines[10], "0 0 0");
    }

    #[test]
    fn test_rejects_scalar_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.asc");
        let scalar = ForcingField::scalar(vec![1.0; 6], 3, 2).unwrap();
        let err = SwanWindWriter::new()
            .write(&[(t(0), scalar)], &path)
            .unwrap_err();
        assert!(matches!(err, FormatError::NotVector));
        assert!(!path.exists());
    }

    #[test]
    fn test_rejects_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wind.asc");
        let bad = ForcingField::vector(vec![f32::NAN; 6], vec![0.0; 6], 3, 2).unwrap();
        let err = SwanWindWriter::new()
            .write(&[(t(0), bad)], &path)
            .unwrap_err();
        assert!(matches!(err, FormatError::Unrepresentable { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_byte_identical_reruns() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.asc");
        let b = dir.path().join("b.asc");
        let series = vec![(t(0), field(3.123, 1.5)), (t(3), field(-8.0, 2.75))];
        SwanWindWriter::new().write(&series, &a).unwrap();
        SwanWindWriter::new().write(&series, &b).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }
}
