//! Run reporting and failure bookkeeping.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;

use archive::CoverageGap;
use wave_common::TimeRange;

use crate::state::RunState;

/// Which pipeline variable a skipped unit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Wind,
    BoundarySpectra,
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Wind => write!(f, "wind"),
            Variable::BoundarySpectra => write!(f, "boundary spectra"),
        }
    }
}

/// One unit of work the run dropped instead of aborting.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedUnit {
    pub window: TimeRange,
    pub variable: Variable,
    pub reason: String,
}

/// Thread-safe append-only log of skipped units.
///
/// Windows are processed concurrently, so failures arrive out of
/// order; the log sorts by window start when drained.
#[derive(Debug, Default)]
pub struct FailureLog {
    units: Mutex<Vec<SkippedUnit>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, unit: SkippedUnit) {
        self.units.lock().expect("failure log poisoned").push(unit);
    }

    pub fn record_all(&self, units: impl IntoIterator<Item = SkippedUnit>) {
        let mut guard = self.units.lock().expect("failure log poisoned");
        guard.extend(units);
    }

    pub fn is_empty(&self) -> bool {
        self.units.lock().expect("failure log poisoned").is_empty()
    }

    /// Drain into a chronologically ordered list.
    pub fn into_sorted(self) -> Vec<SkippedUnit> {
        let mut units = self.units.into_inner().expect("failure log poisoned");
        units.sort_by_key(|u| u.window.start);
        units
    }
}

/// Summary of one completed (or failed) run.
///
/// Serialized to JSON next to the exported files so a run is never
/// silently incomplete: every dropped window, coverage gap and
/// extrapolated sample is listed here.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: String,
    pub state: RunState,
    pub requested: TimeRange,
    pub windows_total: usize,
    pub windows_cancelled: usize,
    pub skipped: Vec<SkippedUnit>,
    pub coverage_gaps: Vec<CoverageGap>,
    /// Output samples that came from a nearest-point or endpoint
    /// fallback rather than regular interpolation.
    pub extrapolated_samples: usize,
    pub files: Vec<PathBuf>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.state == RunState::Done
            && self.skipped.is_empty()
            && self.coverage_gaps.is_empty()
            && self.windows_cancelled == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(day: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2018, 8, day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 8, day, 23, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_log_sorts_by_window_start() {
        let log = FailureLog::new();
        log.record(SkippedUnit {
            window: window(27),
            variable: Variable::Wind,
            reason: "late".into(),
        });
        log.record(SkippedUnit {
            window: window(25),
            variable: Variable::BoundarySpectra,
            reason: "early".into(),
        });
        let sorted = log.into_sorted();
        assert_eq!(sorted[0].reason, "early");
        assert_eq!(sorted[1].reason, "late");
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport {
            run: "TestFjord".into(),
            state: RunState::Done,
            requested: window(25),
            windows_total: 2,
            windows_cancelled: 0,
            skipped: vec![],
            coverage_gaps: vec![],
            extrapolated_samples: 0,
            files: vec![PathBuf::from("windSWAN_TestFjord_20180825-20180825.asc")],
        };
        assert!(report.is_complete());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"state\": \"done\""));
        assert!(json.contains("windSWAN"));
    }
}
