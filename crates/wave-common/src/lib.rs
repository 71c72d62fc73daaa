//! Common types and utilities shared across all wave-downscale crates.

pub mod bbox;
pub mod field;
pub mod sample;
pub mod series;
pub mod spectra;
pub mod time;

pub use bbox::BoundingBox;
pub use field::{FieldError, ForcingField};
pub use sample::{Sample, SampleFlag};
pub use series::{SeriesError, TimeSeries};
pub use spectra::{BasisError, DirectionConvention, SpectralBasis, Spectrum};
pub use time::{TimeParseError, TimeRange};
