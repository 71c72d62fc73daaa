//! The downscaling run driver.
//!
//! Owns the run state machine, fans time windows out over a bounded
//! pool of concurrent tasks, merges their outputs chronologically and
//! exports the result. Patterned as fetch/process/commit: the commit
//! (export) only happens after every surviving window has been merged,
//! so output files are always whole.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Duration;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use archive::{ChunkedFetch, SourceArchive};
use domain::Domain;
use exporter::{forcing_filename, spectra_filename, FormatError, SwanSpecWriter, SwanWindWriter};
use wave_common::TimeRange;

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::report::{FailureLog, RunReport, SkippedUnit, Variable};
use crate::state::RunState;
use crate::window::{process_window, WindowCtx, WindowOutput};

/// One configured downscaling run.
pub struct Downscaler {
    config: RunConfig,
    target: Arc<Domain>,
    archive: Arc<dyn SourceArchive>,
    cancel: CancelToken,
    state: RunState,
}

impl Downscaler {
    /// Pair a validated config with a loaded target domain and an
    /// archive collaborator.
    pub fn new(
        config: RunConfig,
        target: Domain,
        archive: Arc<dyn SourceArchive>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        if config.export_wind && !matches!(target, Domain::Structured(_)) {
            bail!("wind forcing export needs a structured target grid");
        }
        Ok(Self {
            config,
            target: Arc::new(target),
            archive,
            cancel: CancelToken::new(),
            state: RunState::Configured,
        })
    }

    /// Handle for cancelling the run from another task. Windows
    /// already in flight finish; nothing new starts.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run to completion.
    ///
    /// Per-window problems are skipped and reported; a domain or
    /// archive-backend failure aborts with [`RunState::Failed`].
    #[instrument(skip(self), fields(run = %self.config.name))]
    pub async fn run(&mut self) -> anyhow::Result<RunReport> {
        match self.execute().await {
            Ok(report) => Ok(report),
            Err(e) => {
                let _ = self.state.advance(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> anyhow::Result<RunReport> {
        let config = &self.config;

        let edges = config.boundary.edge_selection();
        let boundary = Arc::new(self.target.boundary_points(&edges));
        if config.export_spectra && boundary.is_empty() {
            bail!(
                "target {} has no boundary points on edges {:?}",
                self.target.name(),
                config.boundary.edges
            );
        }
        let target_grid = match self.target.as_ref() {
            Domain::Structured(g) => Some(Arc::new(g.clone())),
            Domain::Unstructured(_) => None,
        };
        self.state.advance(RunState::DomainsLoaded)?;
        info!(
            domain = self.target.name(),
            nodes = self.target.node_count(),
            boundary_points = boundary.len(),
            "target domain ready"
        );

        let target_basis = Arc::new(config.spectra.build_basis()?);
        let ctx = Arc::new(WindowCtx {
            source: ChunkedFetch::new(
                Arc::clone(&self.archive),
                Duration::hours(config.chunk_hours),
            ),
            target: Arc::clone(&self.target),
            target_grid,
            boundary: Arc::clone(&boundary),
            target_basis: Arc::clone(&target_basis),
            remap: config.remap,
            max_gap: Duration::hours(config.max_gap_hours),
            expansion_factor: config.expansion_factor,
            output_step: config.output_step_hours.map(Duration::hours),
            export_wind: config.export_wind,
            export_spectra: config.export_spectra,
        });

        let windows = config.time.windows(Duration::hours(config.window_hours));
        let total = windows.len();
        info!(windows = total, workers = config.workers, "starting run");

        let cancel = self.cancel.clone();
        let mut outputs: Vec<WindowOutput> = {
            let mut stream = stream::iter(windows.into_iter().enumerate())
                .take_while(move |_| futures::future::ready(!cancel.is_cancelled()))
                .map(|(i, w)| process_window(Arc::clone(&ctx), w, i + 1 == total))
                .buffer_unordered(config.workers);

            let mut collected = Vec::with_capacity(total);
            while let Some(result) = stream.next().await {
                collected.push(result.context("archive backend failed")?);
            }
            collected
        };
        let cancelled = total - outputs.len();
        if cancelled > 0 {
            warn!(cancelled, "run cancelled before all windows started");
        }

        // The middle stages ran inside the windows; the run-level
        // machine records their completion in order.
        self.state.advance(RunState::DataFetched)?;
        self.state.advance(RunState::SpatiallyInterpolated)?;
        self.state.advance(RunState::SpectrallyRemapped)?;
        self.state.advance(RunState::TemporallyResampled)?;

        // Chronological merge; completion order is arbitrary.
        outputs.sort_by_key(|o| o.window.start);

        let failures = FailureLog::new();
        let mut gaps = Vec::new();
        let mut extrapolated = 0;
        let mut wind_series = Vec::new();
        let mut spectra_series = Vec::new();
        for output in outputs {
            failures.record_all(output.skipped);
            gaps.extend(output.gaps);
            extrapolated += output.extrapolated;
            wind_series.extend(output.wind);
            spectra_series.extend(output.spectra);
        }

        // Unrepresentable values are recorded like any other skipped
        // unit; only an I/O failure is fatal.
        let mut files = Vec::new();
        let exported_range = exported_range(&wind_series, &spectra_series, config.time);
        if config.export_wind && !wind_series.is_empty() {
            let path = config
                .output_dir
                .join(forcing_filename(&config.name, &exported_range));
            match SwanWindWriter::new().write(&wind_series, &path) {
                Ok(written) => files.push(written),
                Err(FormatError::Io(e)) => return Err(e).context("writing wind forcing"),
                Err(e) => failures.record(SkippedUnit {
                    window: exported_range,
                    variable: Variable::Wind,
                    reason: e.to_string(),
                }),
            }
        }
        if config.export_spectra && !spectra_series.is_empty() {
            let path = config
                .output_dir
                .join(spectra_filename(&config.name, &exported_range));
            match SwanSpecWriter::new().write(
                &target_basis,
                &boundary.positions(),
                &spectra_series,
                &path,
            ) {
                Ok(written) => files.push(written),
                Err(FormatError::Io(e)) => return Err(e).context("writing boundary spectra"),
                Err(e) => failures.record(SkippedUnit {
                    window: exported_range,
                    variable: Variable::BoundarySpectra,
                    reason: e.to_string(),
                }),
            }
        }
        self.state.advance(RunState::Exported)?;
        self.state.advance(RunState::Done)?;

        let report = RunReport {
            run: config.name.clone(),
            state: self.state,
            requested: config.time,
            windows_total: total,
            windows_cancelled: cancelled,
            skipped: failures.into_sorted(),
            coverage_gaps: gaps,
            extrapolated_samples: extrapolated,
            files,
        };
        write_report(&report, config)?;
        info!(
            files = report.files.len(),
            skipped = report.skipped.len(),
            complete = report.is_complete(),
            "run finished"
        );
        Ok(report)
    }
}

/// Time span actually covered by the merged output, for filenames.
fn exported_range(
    wind: &[(chrono::DateTime<chrono::Utc>, wave_common::ForcingField)],
    spectra: &[(
        chrono::DateTime<chrono::Utc>,
        Vec<wave_common::Sample<wave_common::Spectrum>>,
    )],
    requested: TimeRange,
) -> TimeRange {
    let first = wind
        .first()
        .map(|(t, _)| *t)
        .into_iter()
        .chain(spectra.first().map(|(t, _)| *t))
        .min();
    let last = wind
        .last()
        .map(|(t, _)| *t)
        .into_iter()
        .chain(spectra.last().map(|(t, _)| *t))
        .max();
    match (first, last) {
        (Some(start), Some(end)) => TimeRange::new(start, end),
        _ => requested,
    }
}

fn write_report(report: &RunReport, config: &RunConfig) -> anyhow::Result<()> {
    let path = config
        .output_dir
        .join(format!("report_{}.json", config.name));
    let json = report.to_json()?;
    std::fs::create_dir_all(&config.output_dir)?;
    std::fs::write(&path, json).context("writing run report")?;
    Ok(())
}
