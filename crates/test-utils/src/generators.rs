//! Generators for synthetic test geometry.
//!
//! Everything here is deterministic, so tests can verify interpolated
//! results analytically.

use chrono::{DateTime, TimeZone, Utc};

use domain::{Crs, UnstructuredMesh};

/// Timestamp helper: hour `h` on 2018-08-25 UTC.
pub fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 8, 25, 0, 0, 0).unwrap() + chrono::Duration::hours(h as i64)
}

/// A two-triangle unit-square mesh with two open-boundary nodes.
pub fn square_mesh(name: &str) -> UnstructuredMesh {
    UnstructuredMesh::load(
        name,
        vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        vec![[0, 1, 2], [0, 2, 3]],
        vec![true; 4],
        vec![false, true, true, false],
        Crs::Geographic,
    )
    .expect("generator mesh is valid")
}
