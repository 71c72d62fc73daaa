//! Downscaling run orchestration.
//!
//! Composes the domain, archive, interpolation and exporter crates
//! into a single run: load domains, fetch source data in time chunks,
//! interpolate spatially and spectrally, resample to the target
//! cadence, and export SWAN input files.
//!
//! Time windows are processed concurrently (bounded by the configured
//! worker count) since each window depends only on its own input slice
//! plus the immutable domain and basis objects. Outputs are merged in
//! chronological order before export regardless of completion order.
//!
//! Per-window failures are recorded and skipped; the run only aborts
//! when a domain fails to load or the archive is unreachable.

pub mod cancel;
pub mod config;
pub mod report;
pub mod runner;
pub mod state;
pub mod window;

pub use cancel::CancelToken;
pub use config::{BoundarySpec, RunConfig, SpectraSpec, TargetSpec};
pub use report::{FailureLog, RunReport, SkippedUnit, Variable};
pub use runner::Downscaler;
pub use state::RunState;
