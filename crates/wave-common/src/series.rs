//! Time-ordered value series.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("timestamp {t} is not after the previous entry {prev}")]
    NonMonotonic {
        prev: DateTime<Utc>,
        t: DateTime<Utc>,
    },
}

/// An ordered sequence of `(timestamp, value)` pairs.
///
/// Timestamps are strictly increasing, enforced on insertion.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries<T> {
    items: Vec<(DateTime<Utc>, T)>,
}

impl<T> TimeSeries<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n),
        }
    }

    /// Append an entry. Fails unless `t` is after the last timestamp.
    pub fn push(&mut self, t: DateTime<Utc>, value: T) -> Result<(), SeriesError> {
        if let Some(&(prev, _)) = self.items.last() {
            if t <= prev {
                return Err(SeriesError::NonMonotonic { prev, t });
            }
        }
        self.items.push((t, value));
        Ok(())
    }

    /// Build from pairs, validating monotonicity.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (DateTime<Utc>, T)>,
    ) -> Result<Self, SeriesError> {
        let mut s = Self::new();
        for (t, v) in pairs {
            s.push(t, v)?;
        }
        Ok(s)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DateTime<Utc>, T)> {
        self.items.iter()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.items.iter().map(|(t, _)| *t)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, v)| v)
    }

    pub fn get(&self, i: usize) -> Option<&(DateTime<Utc>, T)> {
        self.items.get(i)
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.items.first().map(|(t, _)| *t)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.items.last().map(|(t, _)| *t)
    }

    /// Value at an exact timestamp, if present.
    pub fn at(&self, t: DateTime<Utc>) -> Option<&T> {
        self.items
            .binary_search_by_key(&t, |(ts, _)| *ts)
            .ok()
            .map(|i| &self.items[i].1)
    }

    /// Indices of the entries bracketing `t`: the last entry at or
    /// before and the first entry at or after. Either may be missing
    /// when `t` lies beyond the ends of the series.
    pub fn bracket(&self, t: DateTime<Utc>) -> (Option<usize>, Option<usize>) {
        let after = self.items.partition_point(|(ts, _)| *ts < t);
        let lower = if after > 0
            && (after == self.items.len() || self.items[after].0 != t)
        {
            Some(after - 1)
        } else if after < self.items.len() && self.items[after].0 == t {
            Some(after)
        } else {
            None
        };
        let upper = if after < self.items.len() {
            Some(after)
        } else {
            None
        };
        (lower, upper)
    }

    pub fn into_pairs(self) -> Vec<(DateTime<Utc>, T)> {
        self.items
    }
}

impl<T> IntoIterator for TimeSeries<T> {
    type Item = (DateTime<Utc>, T);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
