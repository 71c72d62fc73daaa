//! The archive collaborator contract.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use domain::StructuredGrid;
use wave_common::{BoundingBox, ForcingField, SpectralBasis, Spectrum, TimeRange};

use crate::error::Result;

/// Declared coverage of a source archive.
#[derive(Debug, Clone)]
pub struct ArchiveMeta {
    /// Archive/product identifier, e.g. "NORA3".
    pub name: String,
    /// Spatial coverage.
    pub bbox: BoundingBox,
    /// Temporal coverage.
    pub time_range: TimeRange,
    /// Native output cadence of the archive.
    pub time_step: Duration,
}

/// Wind (or other scalar/vector forcing) data for one fetch.
///
/// Values come with the source grid they live on, so the spatial
/// interpolator can work without further metadata lookups.
#[derive(Debug, Clone)]
pub struct WindBatch {
    pub grid: StructuredGrid,
    pub steps: Vec<(DateTime<Utc>, ForcingField)>,
}

/// Spectral data for one fetch: one spectrum per output point per step.
#[derive(Debug, Clone)]
pub struct SpectraBatch {
    pub basis: SpectralBasis,
    /// Positions of the archive's spectral output points.
    pub positions: Vec<(f64, f64)>,
    /// Per timestep, one spectrum per position (same ordering).
    pub steps: Vec<(DateTime<Utc>, Vec<Spectrum>)>,
}

/// An external archive of hindcast/forecast output.
///
/// Implementations handle transport, caching and retries themselves;
/// the pipeline only consumes the returned arrays plus coordinate
/// metadata, or the declared "no data" signal ([`crate::CoverageError`]).
///
/// Requests passed to `fetch_*` are already clipped to the coverage
/// declared by [`ArchiveMeta`]; implementations may therefore treat
/// out-of-coverage requests as a backend bug.
#[async_trait]
pub trait SourceArchive: Send + Sync {
    fn meta(&self) -> &ArchiveMeta;

    /// Fetch wind forcing over an area and time window (inclusive).
    async fn fetch_wind(&self, bbox: BoundingBox, window: TimeRange) -> Result<WindBatch>;

    /// Fetch boundary spectra over an area and time window (inclusive).
    async fn fetch_spectra(&self, bbox: BoundingBox, window: TimeRange) -> Result<SpectraBatch>;
}
