//! Time-chunked fetching.
//!
//! Long windows are fetched in fixed-length time chunks so memory use
//! stays bounded by the chunk size, not the window size. The chunk
//! boundary is invisible to callers: the flattened stream behaves as
//! one ordered series, with duplicate boundary timestamps removed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::debug;

use wave_common::{BoundingBox, ForcingField, TimeRange};

use crate::error::{CoverageError, CoverageGap, Result};
use crate::source::{SourceArchive, SpectraBatch, WindBatch};

/// A request clipped to archive coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedRequest {
    pub bbox: BoundingBox,
    pub window: TimeRange,
    /// Present when the requested window was only partially covered.
    pub gap: Option<CoverageGap>,
}

/// Chunked, coverage-aware access to a [`SourceArchive`].
#[derive(Clone)]
pub struct ChunkedFetch {
    archive: Arc<dyn SourceArchive>,
    chunk: Duration,
}

impl ChunkedFetch {
    /// Wrap an archive, fetching at most `chunk` of data at a time.
    pub fn new(archive: Arc<dyn SourceArchive>, chunk: Duration) -> Self {
        Self { archive, chunk }
    }

    pub fn archive(&self) -> &Arc<dyn SourceArchive> {
        &self.archive
    }

    /// Clip a request to the archive's declared coverage.
    ///
    /// The bbox is expanded by `expansion_factor` first so that
    /// interpolation at the target edges has support, then clamped to
    /// valid geographic coordinates. A request entirely outside
    /// coverage fails; a partial overlap yields the intersection plus
    /// a [`CoverageGap`] marker.
    pub fn clip(
        &self,
        bbox: BoundingBox,
        window: TimeRange,
        expansion_factor: f64,
    ) -> Result<ClippedRequest> {
        let meta = self.archive.meta();
        let expanded = bbox.expand_by_factor(expansion_factor).clamp_to_valid();

        let clipped_bbox =
            expanded
                .intersection(&meta.bbox)
                .ok_or(CoverageError::DisjointArea {
                    requested: expanded,
                    coverage: meta.bbox,
                })?;

        let clipped_window =
            window
                .intersection(&meta.time_range)
                .ok_or(CoverageError::DisjointTime {
                    requested: window,
                    coverage: meta.time_range,
                })?;

        let gap = (clipped_window != window).then(|| CoverageGap {
            requested: window,
            covered: clipped_window,
        });
        if let Some(g) = &gap {
            debug!(archive = %meta.name, gap = %g, "request clipped to archive coverage");
        }

        Ok(ClippedRequest {
            bbox: clipped_bbox,
            window: clipped_window,
            gap,
        })
    }

    /// Stream wind batches, one per time chunk.
    pub fn wind_chunks(
        &self,
        req: &ClippedRequest,
    ) -> impl Stream<Item = Result<WindBatch>> + '_ {
        let chunks = req.window.windows(self.chunk);
        let bbox = req.bbox;
        stream::iter(chunks).then(move |w| {
            let archive = Arc::clone(&self.archive);
            async move { archive.fetch_wind(bbox, w).await }
        })
    }

    /// Stream wind timesteps as one logical ordered series.
    pub fn wind_stream(
        &self,
        req: &ClippedRequest,
    ) -> impl Stream<Item = Result<(DateTime<Utc>, ForcingField)>> + '_ {
        dedup_boundaries(
            self.wind_chunks(req)
                .map_ok(|batch| stream::iter(batch.steps.into_iter().map(Ok)))
                .try_flatten(),
        )
    }

    /// Fetch a whole (already memory-bounded) window of wind data.
    ///
    /// Chunks are concatenated; the grid comes from the first chunk.
    pub async fn collect_wind(&self, req: &ClippedRequest) -> Result<WindBatch> {
        let mut chunks = Box::pin(self.wind_chunks(req));
        let mut merged: Option<WindBatch> = None;
        while let Some(batch) = chunks.try_next().await? {
            match &mut merged {
                None => merged = Some(batch),
                Some(m) => {
                    let last = m.steps.last().map(|(t, _)| *t);
                    m.steps.extend(
                        batch
                            .steps
                            .into_iter()
                            .filter(|(t, _)| last.map_or(true, |l| *t > l)),
                    );
                }
            }
        }
        merged.ok_or_else(|| CoverageError::backend("archive returned no wind chunks"))
    }

    /// Stream spectra batches, one per time chunk.
    pub fn spectra_chunks(
        &self,
        req: &ClippedRequest,
    ) -> impl Stream<Item = Result<SpectraBatch>> + '_ {
        let chunks = req.window.windows(self.chunk);
        let bbox = req.bbox;
        stream::iter(chunks).then(move |w| {
            let archive = Arc::clone(&self.archive);
            async move { archive.fetch_spectra(bbox, w).await }
        })
    }

    /// Fetch a whole window of boundary spectra.
    pub async fn collect_spectra(&self, req: &ClippedRequest) -> Result<SpectraBatch> {
        let mut chunks = Box::pin(self.spectra_chunks(req));
        let mut merged: Option<SpectraBatch> = None;
        while let Some(batch) = chunks.try_next().await? {
            match &mut merged {
                None => merged = Some(batch),
                Some(m) => {
                    let last = m.steps.last().map(|(t, _)| *t);
                    m.steps.extend(
                        batch
                            .steps
                            .into_iter()
                            .filter(|(t, _)| last.map_or(true, |l| *t > l)),
                    );
                }
            }
        }
        merged.ok_or_else(|| CoverageError::backend("archive returned no spectra chunks"))
    }
}

/// Drop repeated timestamps at chunk joins (inclusive chunk windows
/// produce the join instant twice).
fn dedup_boundaries<S, T>(inner: S) -> impl Stream<Item = Result<(DateTime<Utc>, T)>>
where
    S: Stream<Item = Result<(DateTime<Utc>, T)>>,
{
    inner
        .scan(None::<DateTime<Utc>>, |last, item| {
            let keep = match &item {
                Ok((t, _)) => {
                    if last.map_or(false, |l| *t <= l) {
                        false
                    } else {
                        *last = Some(*t);
                        true
                    }
                }
                Err(_) => true,
            };
            futures::future::ready(Some(keep.then_some(item)))
        })
        .filter_map(futures::future::ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryArchive;
    use chrono::TimeZone;
    use futures::StreamExt;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 8, 25, h, 0, 0).unwrap()
    }

    fn archive() -> ChunkedFetch {
        let a = InMemoryArchive::uniform_test_archive(
            "test",
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            TimeRange::new(t(0), t(21)),
            Duration::hours(3),
        );
        ChunkedFetch::new(Arc::new(a), Duration::hours(6))
    }

    #[test]
    fn test_clip_disjoint_time_fails() {
        let f = archive();
        let window = TimeRange::new(
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2019, 1, 2, 0, 0, 0).unwrap(),
        );
        let err = f
            .clip(BoundingBox::new(2.0, 2.0, 4.0, 4.0), window, 1.0)
            .unwrap_err();
        assert!(matches!(err, CoverageError::DisjointTime { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_clip_partial_records_gap() {
        let f = archive();
        let window = TimeRange::new(t(12), Utc.with_ymd_and_hms(2018, 8, 26, 12, 0, 0).unwrap());
        let req = f
            .clip(BoundingBox::new(2.0, 2.0, 4.0, 4.0), window, 1.0)
            .unwrap();
        let gap = req.gap.expect("partial coverage must record a gap");
        assert_eq!(gap.requested, window);
        assert_eq!(gap.covered.end, t(21));
        assert_eq!(req.window.start, t(12));
    }

    #[tokio::test]
    async fn test_stream_hides_chunk_boundaries() {
        let f = archive();
        let req = f
            .clip(
                BoundingBox::new(2.0, 2.0, 4.0, 4.0),
                TimeRange::new(t(0), t(21)),
                1.0,
            )
            .unwrap();
        let items: Vec<_> = f
            .wind_stream(&req)
            .map(|r| r.unwrap().0)
            .collect()
            .await;
        // 3-hourly from 00 to 21 inclusive, no duplicates at the
        // 6-hour chunk joins.
        let expected: Vec<_> = (0..8).map(|i| t(i * 3)).collect();
        assert_eq!(items, expected);
    }

    #[tokio::test]
    async fn test_collect_matches_stream() {
        let f = archive();
        let req = f
            .clip(
                BoundingBox::new(2.0, 2.0, 4.0, 4.0),
                TimeRange::new(t(0), t(21)),
                1.0,
            )
            .unwrap();
        let batch = f.collect_wind(&req).await.unwrap();
        assert_eq!(batch.steps.len(), 8);
        let times: Vec<_> = batch.steps.iter().map(|(t, _)| *t).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }
}
