//! Shared test utilities for the wave-downscale workspace.
//!
//! Deterministic mesh generators and archive fixtures, so integration
//! tests across crates agree on their inputs.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
