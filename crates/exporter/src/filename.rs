//! Output filename templating.

use wave_common::TimeRange;

const DATE_FORMAT: &str = "%Y%m%d";

fn span(range: &TimeRange) -> String {
    format!(
        "{}-{}",
        range.start.format(DATE_FORMAT),
        range.end.format(DATE_FORMAT)
    )
}

/// Name for a SWAN wind forcing file, e.g.
/// `windSWAN_Skjerjehamn300_20180825-20180827.asc`.
pub fn forcing_filename(grid_name: &str, range: &TimeRange) -> String {
    format!("windSWAN_{}_{}.asc", grid_name, span(range))
}

/// Name for a SWAN spectral boundary file, e.g.
/// `specSWAN_Skjerjehamn300_20180825-20180827.bnd`.
pub fn spectra_filename(grid_name: &str, range: &TimeRange) -> String {
    format!("specSWAN_{}_{}.bnd", grid_name, span(range))
}
