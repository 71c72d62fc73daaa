//! Source data adapter for wave hindcast/forecast archives.
//!
//! The archive itself (remote store, local files, object storage) is
//! an external collaborator behind the [`SourceArchive`] trait. This
//! crate adds the behavior the pipeline relies on: coverage clipping
//! with explicit gap markers, and time-chunked streaming so a long run
//! never materializes more than one chunk in memory.

pub mod chunked;
pub mod error;
pub mod memory;
pub mod source;

pub use chunked::{ChunkedFetch, ClippedRequest};
pub use error::{CoverageError, CoverageGap, Result};
pub use memory::InMemoryArchive;
pub use source::{ArchiveMeta, SourceArchive, SpectraBatch, WindBatch};
