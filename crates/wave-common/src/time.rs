//! Time handling for hindcast/forecast series.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("invalid time format: {0}")]
    InvalidFormat(String),
    #[error("time range end {end} is not after start {start}")]
    EmptyRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Parse an ISO 8601 timestamp.
///
/// Accepts full RFC 3339 (`2018-08-25T00:00:00Z`), naive datetimes
/// assumed UTC (`2018-08-25T00:00:00` and `2018-08-25T00:00`), and a
/// bare date (midnight).
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{s}T00:00:00"), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Parse a `start/end` pair of ISO 8601 strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        let start = parse_iso8601(start)?;
        let end = parse_iso8601(end)?;
        if end < start {
            return Err(TimeParseError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        dt >= self.start && dt <= self.end
    }

    /// Intersection with another range, `None` if disjoint.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            None
        } else {
            Some(TimeRange::new(start, end))
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Timestamps at a fixed cadence from `start` to `end` inclusive.
    pub fn steps(&self, step: Duration) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        if step <= Duration::zero() {
            return out;
        }
        let mut t = self.start;
        while t <= self.end {
            out.push(t);
            t += step;
        }
        out
    }

    /// Split the range into consecutive windows of at most `window` length.
    ///
    /// Windows abut: each window ends where the next begins. The last
    /// window may be shorter.
    pub fn windows(&self, window: Duration) -> Vec<TimeRange> {
        let mut out = Vec::new();
        if window <= Duration::zero() {
            return vec![*self];
        }
        let mut start = self.start;
        while start < self.end {
            let end = (start + window).min(self.end);
            out.push(TimeRange::new(start, end));
            start = end;
        }
        if out.is_empty() {
            // Degenerate single-instant range.
            out.push(*self);
        }
        out
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.end.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}
