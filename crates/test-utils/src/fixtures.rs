//! Pre-built end-to-end fixtures.

use chrono::Duration;

use archive::InMemoryArchive;
use wave_common::{BoundingBox, TimeRange};

use crate::generators::hour;

/// Spatial coverage of the standard test archive.
pub fn archive_bbox() -> BoundingBox {
    BoundingBox::new(0.0, 55.0, 10.0, 65.0)
}

/// A small target area well inside [`archive_bbox`].
pub fn target_bbox() -> BoundingBox {
    BoundingBox::new(4.0, 60.0, 6.0, 61.0)
}

/// Two days of 3-hourly coverage.
pub fn archive_range() -> TimeRange {
    TimeRange::new(hour(0), hour(48))
}

/// The standard in-memory archive: all-sea 11x11 source grid,
/// 3-hourly steps, uniform swell spectra and linearly ramping wind.
pub fn standard_archive() -> InMemoryArchive {
    InMemoryArchive::uniform_test_archive(
        "NORA3-test",
        archive_bbox(),
        archive_range(),
        Duration::hours(3),
    )
}

/// The standard archive with a hole cut out of its series.
pub fn gappy_archive(gap: TimeRange) -> InMemoryArchive {
    standard_archive().with_gap(gap)
}
