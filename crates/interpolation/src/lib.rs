//! Interpolation engines for the downscaling pipeline.
//!
//! Three independent concerns, composed by the orchestrator:
//!
//! - [`spatial`]: source domain nodes -> arbitrary target points
//!   (bilinear on grids, barycentric on meshes, land-mask aware).
//! - [`spectral`]: remap 2-D wave spectra between frequency/direction
//!   discretizations while conserving total energy.
//! - [`temporal`]: align source timesteps to the target cadence.
//!
//! Everything here is pure and deterministic: the same inputs always
//! produce bit-identical outputs.

pub mod error;
pub mod spatial;
pub mod spectral;
pub mod temporal;

pub use error::{InterpolationError, Result};
pub use spatial::{
    barycentric_at, bilinear_at, interpolate_field, interpolate_spectra, nearest_spectrum,
};
pub use spectral::{remap, RemapOptions, RemapOutcome};
pub use temporal::{resample, resample_scalar, Lerp};
