//! Run configuration.
//!
//! A [`RunConfig`] is deserialized from YAML and validated before a
//! run starts. Anything the pipeline treats as declared truth lives
//! here: the target area and spacing, the boundary edge selection,
//! the target spectral discretization including its direction
//! convention, and the operational knobs (windowing, workers, gap
//! tolerance).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain::{EdgeSelection, StructuredGrid};
use interpolation::RemapOptions;
use wave_common::{BoundingBox, DirectionConvention, SpectralBasis, TimeRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The target area, as a bbox plus metric node spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub bbox: BoundingBox,
    /// Node spacing in metres, converted to degrees at the bbox center
    /// latitude.
    pub spacing_m: f64,
}

impl TargetSpec {
    pub fn build_grid(&self, name: &str) -> domain::Result<StructuredGrid> {
        StructuredGrid::from_bbox_with_spacing_m(name, self.bbox, self.spacing_m)
    }
}

/// Which target edges receive boundary spectra.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySpec {
    /// Compass letters, e.g. `"NWS"` for a coast on the east side.
    #[serde(default = "default_edges")]
    pub edges: String,
    /// Keep only the midpoint of each selected edge.
    #[serde(default)]
    pub midpoints_only: bool,
}

fn default_edges() -> String {
    "NSEW".to_string()
}

impl Default for BoundarySpec {
    fn default() -> Self {
        Self {
            edges: default_edges(),
            midpoints_only: false,
        }
    }
}

impl BoundarySpec {
    pub fn edge_selection(&self) -> EdgeSelection {
        let e = EdgeSelection::from_letters(&self.edges);
        if self.midpoints_only {
            e.midpoints()
        } else {
            e
        }
    }
}

/// Target spectral discretization: geometric frequencies, regular
/// directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectraSpec {
    #[serde(default = "default_f0")]
    pub f0: f64,
    #[serde(default = "default_growth")]
    pub growth: f64,
    pub nfreq: usize,
    pub ndir: usize,
    #[serde(default = "default_convention")]
    pub convention: DirectionConvention,
}

fn default_f0() -> f64 {
    0.04
}

fn default_growth() -> f64 {
    1.1
}

fn default_convention() -> DirectionConvention {
    DirectionConvention::ComingFrom
}

impl SpectraSpec {
    pub fn build_basis(&self) -> Result<SpectralBasis, ConfigError> {
        SpectralBasis::geometric(self.f0, self.growth, self.nfreq, self.ndir, self.convention)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Everything one downscaling run needs to know up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run (and target grid) name; used in output filenames.
    pub name: String,
    /// Requested output time range.
    pub time: TimeRange,
    pub target: TargetSpec,
    #[serde(default)]
    pub boundary: BoundarySpec,
    pub spectra: SpectraSpec,
    #[serde(default)]
    pub remap: RemapOptions,

    /// Output cadence in hours; defaults to the archive's native step.
    #[serde(default)]
    pub output_step_hours: Option<i64>,
    /// Widest source hole to bridge by linear interpolation.
    #[serde(default = "default_max_gap_hours")]
    pub max_gap_hours: i64,
    /// Fetch bbox growth so edge interpolation has support.
    #[serde(default = "default_expansion_factor")]
    pub expansion_factor: f64,
    /// Length of one concurrently processed unit of work.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Size of one archive fetch within a window.
    #[serde(default = "default_chunk_hours")]
    pub chunk_hours: i64,
    /// Concurrent window limit.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_export_wind")]
    pub export_wind: bool,
    #[serde(default = "default_export_spectra")]
    pub export_spectra: bool,
    pub output_dir: PathBuf,
}

fn default_max_gap_hours() -> i64 {
    6
}

fn default_expansion_factor() -> f64 {
    1.2
}

fn default_window_hours() -> i64 {
    24
}

fn default_chunk_hours() -> i64 {
    24
}

fn default_workers() -> usize {
    4
}

fn default_export_wind() -> bool {
    true
}

fn default_export_spectra() -> bool {
    true
}

impl RunConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("run name must not be empty".into()));
        }
        if self.time.end <= self.time.start {
            return Err(ConfigError::Invalid(format!(
                "time range must end after it starts, got {} to {}",
                self.time.start, self.time.end
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.window_hours <= 0 || self.chunk_hours <= 0 {
            return Err(ConfigError::Invalid(
                "window_hours and chunk_hours must be positive".into(),
            ));
        }
        if self.max_gap_hours <= 0 {
            return Err(ConfigError::Invalid("max_gap_hours must be positive".into()));
        }
        if self.expansion_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "expansion_factor must be >= 1.0, got {}",
                self.expansion_factor
            )));
        }
        if let Some(step) = self.output_step_hours {
            if step <= 0 {
                return Err(ConfigError::Invalid(
                    "output_step_hours must be positive".into(),
                ));
            }
        }
        if !self.export_wind && !self.export_spectra {
            return Err(ConfigError::Invalid(
                "at least one of export_wind/export_spectra must be enabled".into(),
            ));
        }
        let edges = self.boundary.edge_selection();
        if self.export_spectra && !(edges.north || edges.south || edges.east || edges.west) {
            return Err(ConfigError::Invalid(format!(
                "boundary edges {:?} select nothing",
                self.boundary.edges
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: TestFjord
time:
  start: 2018-08-25T00:00:00Z
  end: 2018-08-27T00:00:00Z
target:
  bbox: { min_lon: 4.0, min_lat: 60.0, max_lon: 6.0, max_lat: 61.0 }
  spacing_m: 1000.0
boundary:
  edges: NWS
  midpoints_only: true
spectra:
  nfreq: 32
  ndir: 36
output_dir: /tmp/out
"#;

    #[test]
    fn test_parse_with_defaults() {
        let c = RunConfig::from_yaml(YAML).unwrap();
        assert_eq!(c.name, "TestFjord");
        assert_eq!(c.workers, 4);
        assert_eq!(c.window_hours, 24);
        assert_eq!(c.max_gap_hours, 6);
        assert!((c.expansion_factor - 1.2).abs() < 1e-12);
        assert!(c.export_wind && c.export_spectra);
        assert_eq!(c.output_step_hours, None);

        let edges = c.boundary.edge_selection();
        assert!(edges.north && edges.west && edges.south && !edges.east);
        assert!(edges.midpoints_only);

        let basis = c.spectra.build_basis().unwrap();
        assert_eq!(basis.nfreq(), 32);
        assert_eq!(basis.ndir(), 36);
        assert_eq!(basis.convention(), DirectionConvention::ComingFrom);
    }

    #[test]
    fn test_target_grid_spacing() {
        let c = RunConfig::from_yaml(YAML).unwrap();
        let grid = c.target.build_grid(&c.name).unwrap();
        // ~1 km spacing over a 2-degree-wide box at 60.5N.
        assert!(grid.nx() > 50 && grid.ny() > 50);
        assert_eq!(grid.name(), "TestFjord");
    }

    #[test]
    fn test_rejects_reversed_time_range() {
        let mut c = RunConfig::from_yaml(YAML).unwrap();
        c.time = TimeRange::new(c.time.end, c.time.start);
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
        // A zero-length range would make an empty run look complete.
        c.time = TimeRange::new(c.time.start, c.time.start);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut c = RunConfig::from_yaml(YAML).unwrap();
        c.workers = 0;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_edge_selection() {
        let mut c = RunConfig::from_yaml(YAML).unwrap();
        c.boundary.edges = "X".into();
        assert!(c.validate().is_err());
        // Unless spectra export is off entirely.
        c.export_spectra = false;
        assert!(c.validate().is_ok());
    }
}
