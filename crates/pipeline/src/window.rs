//! Per-window processing.
//!
//! One time window is the unit of both concurrency and failure: it
//! fetches its own source slice, runs the spatial, spectral and
//! temporal stages, and either yields export-ready series or records
//! why a variable was dropped. Windows share only immutable context,
//! so any number of them can run at once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use archive::{ChunkedFetch, CoverageError, CoverageGap, SpectraBatch, WindBatch};
use domain::{BoundaryPointSet, Domain, StructuredGrid};
use interpolation::{interpolate_field, nearest_spectrum, remap, resample, RemapOptions};
use wave_common::{
    ForcingField, Sample, SampleFlag, SpectralBasis, Spectrum, TimeRange, TimeSeries,
};

use crate::report::{SkippedUnit, Variable};

/// Immutable context shared by every window of a run.
pub struct WindowCtx {
    pub source: ChunkedFetch,
    pub target: Arc<Domain>,
    /// Set when the target is a structured grid; wind forcing is
    /// produced on these nodes.
    pub target_grid: Option<Arc<StructuredGrid>>,
    pub boundary: Arc<BoundaryPointSet>,
    pub target_basis: Arc<SpectralBasis>,
    pub remap: RemapOptions,
    pub max_gap: Duration,
    pub expansion_factor: f64,
    /// Output cadence; `None` means the archive's native step.
    pub output_step: Option<Duration>,
    pub export_wind: bool,
    pub export_spectra: bool,
}

/// Export-ready output of one window.
#[derive(Debug)]
pub struct WindowOutput {
    pub window: TimeRange,
    pub wind: Vec<(DateTime<Utc>, ForcingField)>,
    pub spectra: Vec<(DateTime<Utc>, Vec<Sample<Spectrum>>)>,
    pub gaps: Vec<CoverageGap>,
    pub skipped: Vec<SkippedUnit>,
    pub extrapolated: usize,
}

impl WindowOutput {
    fn empty(window: TimeRange) -> Self {
        Self {
            window,
            wind: Vec::new(),
            spectra: Vec::new(),
            gaps: Vec::new(),
            skipped: Vec::new(),
            extrapolated: 0,
        }
    }

    fn skip(&mut self, variable: Variable, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(window = %self.window, %variable, %reason, "skipping unit of work");
        self.skipped.push(SkippedUnit {
            window: self.window,
            variable,
            reason,
        });
    }
}

/// Worse-wins flag merge across pipeline stages.
fn combine_flags(a: SampleFlag, b: SampleFlag) -> SampleFlag {
    use SampleFlag::*;
    match (a, b) {
        (EnergyMismatch, _) | (_, EnergyMismatch) => EnergyMismatch,
        (CoverageGap, _) | (_, CoverageGap) => CoverageGap,
        (Extrapolated, _) | (_, Extrapolated) => Extrapolated,
        (Valid, Valid) => Valid,
    }
}

/// Process one time window end to end.
///
/// `last` marks the final window of the run; earlier windows exclude
/// their end instant so abutting windows never emit it twice.
///
/// Only a fatal archive failure propagates as `Err`; every other
/// problem downgrades to a recorded skip.
pub async fn process_window(
    ctx: Arc<WindowCtx>,
    window: TimeRange,
    last: bool,
) -> Result<WindowOutput, CoverageError> {
    let mut out = WindowOutput::empty(window);
    let meta = ctx.source.archive().meta().clone();
    let step = ctx.output_step.unwrap_or(meta.time_step);

    let mut targets = window.steps(step);
    if !last {
        targets.retain(|&t| t < window.end);
    }
    if targets.is_empty() {
        return Ok(out);
    }

    // Pad by one source step per side so the resampler has brackets at
    // the window edges.
    let padded = TimeRange::new(window.start - meta.time_step, window.end + meta.time_step);
    let req = match ctx.source.clip(ctx.target.bbox(), padded, ctx.expansion_factor) {
        Ok(req) => req,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            if ctx.export_wind && ctx.target_grid.is_some() {
                out.skip(Variable::Wind, e.to_string());
            }
            if ctx.export_spectra && !ctx.boundary.is_empty() {
                out.skip(Variable::BoundarySpectra, e.to_string());
            }
            return Ok(out);
        }
    };
    // The pad is allowed to fall off the archive ends; only a clip
    // that eats into the window itself is a real coverage gap.
    if req.window.start > window.start || req.window.end < window.end {
        out.gaps.push(CoverageGap {
            requested: window,
            covered: req.window,
        });
    }

    if ctx.export_wind {
        if let Some(grid) = &ctx.target_grid {
            match ctx.source.collect_wind(&req).await {
                Ok(batch) => process_wind(&ctx, grid, batch, &targets, &mut out),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => out.skip(Variable::Wind, e.to_string()),
            }
        }
    }

    if ctx.export_spectra && !ctx.boundary.is_empty() {
        match ctx.source.collect_spectra(&req).await {
            Ok(batch) => process_spectra(&ctx, batch, req.bbox, &targets, &mut out),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => out.skip(Variable::BoundarySpectra, e.to_string()),
        }
    }

    debug!(
        window = %window,
        wind_steps = out.wind.len(),
        spectra_steps = out.spectra.len(),
        skipped = out.skipped.len(),
        "window processed"
    );
    Ok(out)
}

/// Spatially interpolate wind to the target grid, then resample to the
/// target cadence.
fn process_wind(
    ctx: &WindowCtx,
    grid: &StructuredGrid,
    batch: WindBatch,
    targets: &[DateTime<Utc>],
    out: &mut WindowOutput,
) {
    let nodes: Vec<(f64, f64)> = (0..grid.ny())
        .flat_map(|row| (0..grid.nx()).map(move |col| (col, row)))
        .map(|(col, row)| grid.node_position(col, row))
        .collect();
    let source = Domain::Structured(batch.grid.clone());

    let mut series = TimeSeries::with_capacity(batch.steps.len());
    for (t, field) in &batch.steps {
        let Some(v_values) = field.v() else {
            out.skip(Variable::Wind, "archive returned scalar wind");
            return;
        };
        let u64s: Vec<f64> = field.u().iter().map(|&x| x as f64).collect();
        let v64s: Vec<f64> = v_values.iter().map(|&x| x as f64).collect();

        let (u, v) = match (
            interpolate_field(&source, &u64s, &nodes),
            interpolate_field(&source, &v64s, &nodes),
        ) {
            (Ok(u), Ok(v)) => (u, v),
            (Err(e), _) | (_, Err(e)) => {
                out.skip(Variable::Wind, e.to_string());
                return;
            }
        };

        let missing = u.iter().chain(&v).filter(|s| s.is_no_data()).count();
        if missing > 0 {
            // Wind forcing needs a value at every node; a hole here
            // means the source mask cannot support this target.
            out.skip(
                Variable::Wind,
                format!("no valid source wind at {missing} target node samples"),
            );
            return;
        }
        out.extrapolated += u
            .iter()
            .chain(&v)
            .filter(|s| s.flag == SampleFlag::Extrapolated)
            .count();

        let u32s: Vec<f32> = u.iter().map(|s| s.value.unwrap_or(0.0) as f32).collect();
        let v32s: Vec<f32> = v.iter().map(|s| s.value.unwrap_or(0.0) as f32).collect();
        let field = match ForcingField::vector(u32s, v32s, grid.nx(), grid.ny()) {
            Ok(f) => f,
            Err(e) => {
                out.skip(Variable::Wind, e.to_string());
                return;
            }
        };
        if series.push(*t, field).is_err() {
            out.skip(Variable::Wind, format!("archive wind steps not ordered at {t}"));
            return;
        }
    }

    match resample(&series, targets, ctx.max_gap) {
        Ok(resampled) => {
            for (t, sample) in resampled {
                if sample.flag == SampleFlag::Extrapolated {
                    out.extrapolated += 1;
                }
                if let Some(field) = sample.value {
                    out.wind.push((t, field));
                }
            }
        }
        Err(e) => out.skip(Variable::Wind, e.to_string()),
    }
}

/// Select, remap and resample boundary spectra for every boundary
/// point of the target.
fn process_spectra(
    ctx: &WindowCtx,
    batch: SpectraBatch,
    coverage: wave_common::BoundingBox,
    targets: &[DateTime<Utc>],
    out: &mut WindowOutput,
) {
    if batch.positions.is_empty() {
        out.skip(
            Variable::BoundarySpectra,
            "archive returned no spectral output points",
        );
        return;
    }

    // One source point per boundary point; spectra come from the
    // closest archive output point so the spectral shape stays
    // physical instead of being blended across sites.
    let selected: Vec<usize> = ctx
        .boundary
        .iter()
        .map(|p| {
            nearest_spectrum(&batch.positions, p.lon, p.lat).expect("positions checked non-empty")
        })
        .collect();
    let mut unique: Vec<usize> = selected.clone();
    unique.sort_unstable();
    unique.dedup();

    // Remap each selected source point once per timestep, shared by
    // every boundary point that picked it.
    let mut remapped: Vec<HashMap<usize, interpolation::RemapOutcome>> =
        Vec::with_capacity(batch.steps.len());
    for (t, spectra) in &batch.steps {
        let mut per_step = HashMap::with_capacity(unique.len());
        for &i in &unique {
            let Some(spectrum) = spectra.get(i) else {
                out.skip(
                    Variable::BoundarySpectra,
                    format!("archive step {t} is missing spectrum {i}"),
                );
                return;
            };
            per_step.insert(
                i,
                remap(spectrum, &batch.basis, &ctx.target_basis, &ctx.remap),
            );
        }
        remapped.push(per_step);
    }

    let n_points = ctx.boundary.len();
    let mut columns: Vec<Vec<Sample<Spectrum>>> = Vec::with_capacity(n_points);
    for (k, point) in ctx.boundary.iter().enumerate() {
        let src = selected[k];
        let mut point_flag = if coverage.contains(point.lon, point.lat) {
            SampleFlag::Valid
        } else {
            SampleFlag::Extrapolated
        };

        let mut series = TimeSeries::with_capacity(batch.steps.len());
        for ((t, _), per_step) in batch.steps.iter().zip(&remapped) {
            let outcome = &per_step[&src];
            if outcome.beyond_cap(&ctx.remap) {
                out.skip(
                    Variable::BoundarySpectra,
                    format!(
                        "point ({:.4}, {:.4}) at {t}: remap energy drift {:.0}% beyond cap",
                        point.lon,
                        point.lat,
                        outcome.drift * 100.0
                    ),
                );
                continue;
            }
            point_flag = combine_flags(point_flag, outcome.flag);
            // Strictly increasing by construction; skipped steps just
            // leave a hole for the resampler to judge.
            let _ = series.push(*t, outcome.spectrum.clone());
        }

        if series.is_empty() {
            columns.push(vec![Sample::no_data(); targets.len()]);
            continue;
        }

        match resample(&series, targets, ctx.max_gap) {
            Ok(resampled) => {
                let column = resampled
                    .into_iter()
                    .map(|(_, sample)| {
                        let flag = combine_flags(sample.flag, point_flag);
                        if flag == SampleFlag::Extrapolated {
                            out.extrapolated += 1;
                        }
                        Sample {
                            value: sample.value,
                            flag,
                        }
                    })
                    .collect();
                columns.push(column);
            }
            Err(e) => {
                out.skip(
                    Variable::BoundarySpectra,
                    format!(
                        "point ({:.4}, {:.4}): {e}",
                        point.lon, point.lat
                    ),
                );
                columns.push(vec![Sample::no_data(); targets.len()]);
            }
        }
    }

    out.spectra = targets
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let row = columns.iter().map(|col| col[i].clone()).collect();
            (t, row)
        })
        .collect();
}
