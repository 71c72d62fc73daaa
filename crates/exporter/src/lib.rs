//! Writers producing the downstream wave model's input files.
//!
//! The external model defines the exact byte layout; these writers
//! reproduce it verbatim, including fixed timestamp formats and the
//! integer scaling of field values. Anything the format cannot
//! represent is an error, never a silent truncation.
//!
//! All writers go through a temporary file in the destination
//! directory and rename on success, so a cancelled or failed run never
//! leaves a partial file in a visible location.

pub mod atomic;
pub mod error;
pub mod filename;
pub mod swan_spec;
pub mod swan_wind;

pub use error::{FormatError, Result};
pub use filename::{forcing_filename, spectra_filename};
pub use swan_spec::SwanSpecWriter;
pub use swan_wind::SwanWindWriter;

/// Timestamp layout shared by the SWAN input formats.
pub(crate) const SWAN_TIME_FORMAT: &str = "%Y%m%d.%H%M%S";
