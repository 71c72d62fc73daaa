//! Flagged sample values.
//!
//! Interpolation results carry a provenance flag so that fallbacks and
//! quality issues survive all the way into the run report. A missing
//! value is represented as `None`, never as zero.

use serde::{Deserialize, Serialize};

/// Provenance/quality flag attached to an interpolated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFlag {
    /// Regular interpolation inside source coverage.
    Valid,
    /// Nearest-valid fallback outside source coverage, or a temporal
    /// sample beyond the ends of the source series.
    Extrapolated,
    /// Spectral remap energy drift exceeded tolerance; value kept.
    EnergyMismatch,
    /// The source archive only partially covered the requested window.
    CoverageGap,
}

/// A value with its provenance flag. `value: None` means no data.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub value: Option<T>,
    pub flag: SampleFlag,
}

impl<T> Sample<T> {
    pub fn valid(value: T) -> Self {
        Self {
            value: Some(value),
            flag: SampleFlag::Valid,
        }
    }

    pub fn extrapolated(value: T) -> Self {
        Self {
            value: Some(value),
            flag: SampleFlag::Extrapolated,
        }
    }

    pub fn flagged(value: T, flag: SampleFlag) -> Self {
        Self {
            value: Some(value),
            flag,
        }
    }

    /// A missing value. Must propagate; never defaulted to zero.
    pub fn no_data() -> Self {
        Self {
            value: None,
            flag: SampleFlag::Valid,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.value.is_none()
    }

    /// Map the contained value, keeping the flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sample<U> {
        Sample {
            value: self.value.map(f),
            flag: self.flag,
        }
    }
}
