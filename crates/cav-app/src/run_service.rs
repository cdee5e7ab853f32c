//! Run execution service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use cav_core::Real;
use cav_core::timing::{PerfStats, Timer, kernel_timing};
use cav_project::CaseConfig;
use cav_results::{
    ErrorNormsRecord, RunManifest, RunOutcomeRecord, RunStore, compute_run_id, load_restart_file,
};
use cav_solver::{
    ErrorNorms, FlowState, FreshStart, InitialStateProvider, Mode, OutputSink, Scheme,
    SolveProgressEvent, Solver, Termination,
};

use crate::case_compile::{self, CompiledCase};
use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};

/// Options for running a case.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Wall-clock breakdown of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub setup_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub total_time_s: f64,
    pub iterations: usize,
}

impl From<&PerfStats> for RunTimingSummary {
    fn from(perf: &PerfStats) -> Self {
        Self {
            setup_time_s: perf.setup_time_s,
            solve_time_s: perf.solve_time_s,
            save_time_s: perf.save_time_s,
            total_time_s: perf.total_time_s(),
            iterations: perf.iterations,
        }
    }
}

/// What a finished run reports back.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
    pub termination: Termination,
    /// Last executed iteration
    pub iterations: usize,
    pub time: Real,
    pub residuals: [Real; 3],
    pub ratio: Real,
    pub error_norms: Option<ErrorNorms>,
    pub timing: RunTimingSummary,
    /// Kernel breakdown, present when timing is enabled
    pub kernel_timing: Option<String>,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Cavity => "cavity",
        Mode::Manufactured => "manufactured",
    }
}

fn scheme_name(scheme: Scheme) -> &'static str {
    match scheme {
        Scheme::SymmetricGaussSeidel => "sgs",
        Scheme::PointJacobi => "point_jacobi",
    }
}

fn finite_or_none(values: [Real; 3]) -> Option<[Real; 3]> {
    values.iter().all(|v| v.is_finite()).then_some(values)
}

/// Initial state of the case: its restart record when one is named,
/// otherwise the uniform fresh start.
pub fn initial_state(case: &CaseConfig, compiled: &CompiledCase) -> AppResult<FlowState> {
    let state = match &case.restart {
        Some(path) => {
            let record = load_restart_file(path)?;
            tracing::info!(
                path = %path.display(),
                iteration = record.iteration,
                "continuing from restart record"
            );
            record.initial_state(&compiled.setup)?
        }
        None => FreshStart.initial_state(&compiled.setup)?,
    };
    Ok(state)
}

/// Run a case with default options, writing output under `out_dir`.
pub fn run_case(
    case: &CaseConfig,
    out_dir: &Path,
    progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunSummary> {
    run_case_with_options(case, out_dir, &RunOptions::default(), progress_cb)
}

/// Run a case and stream progress events while it iterates.
pub fn run_case_with_options(
    case: &CaseConfig,
    out_dir: &Path,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunSummary> {
    let started = Instant::now();
    let mut perf = PerfStats::default();
    kernel_timing::reset_all();

    emit_progress(&mut progress_cb, RunStage::LoadingCase, started, None);
    let setup_timer = Timer::always("setup");
    let compiled = case_compile::compile_case(case)?;

    emit_progress(&mut progress_cb, RunStage::PreparingState, started, None);
    let state = initial_state(case, &compiled)?;
    let resume = case.restart.is_some();

    let run_id = compute_run_id(case, &options.solver_version);
    let store = RunStore::new(out_dir.to_path_buf())?;
    let mut writer = store.open_run(&run_id, compiled.mode == Mode::Manufactured, resume)?;

    let CompiledCase {
        setup,
        numerics,
        mode,
        scheme,
    } = compiled;
    let mut solver = Solver::new(setup, numerics, mode, scheme, state)?;
    let first_iteration = solver.iteration();
    if !resume {
        writer.write_snapshot(&solver.snapshot(first_iteration - 1))?;
    }
    perf.setup_time_s = setup_timer.stop().unwrap_or_default();

    tracing::info!(
        run_id = %run_id,
        case = %case.name,
        mode = mode_name(mode),
        scheme = scheme_name(scheme),
        nx = case.grid.nx,
        ny = case.grid.ny,
        "starting run"
    );
    emit_progress(
        &mut progress_cb,
        RunStage::Solving,
        started,
        Some(format!("Solving {}x{}", case.grid.nx, case.grid.ny)),
    );

    let solve_timer = Timer::always("solve");
    let outcome = {
        let mut forward = |event: SolveProgressEvent| {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(RunProgressEvent {
                    stage: RunStage::Solving,
                    elapsed_wall_s: started.elapsed().as_secs_f64(),
                    message: None,
                    iteration: Some(event.iteration),
                    ratio: Some(event.ratio),
                    residuals: Some([event.res[0], event.res[1], event.res[2]]),
                });
            }
        };
        solver.run(&mut writer, Some(&mut forward))?
    };
    perf.solve_time_s = solve_timer.stop().unwrap_or_default();
    perf.iterations = (outcome.iterations + 1).saturating_sub(first_iteration);
    drop(writer);

    emit_progress(&mut progress_cb, RunStage::SavingResults, started, None);
    let save_timer = Timer::always("save");
    let residuals = [
        outcome.residuals[0],
        outcome.residuals[1],
        outcome.residuals[2],
    ];
    let manifest = RunManifest {
        run_id: run_id.clone(),
        case_name: case.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: options.solver_version.clone(),
        mode: mode_name(mode).to_string(),
        scheme: scheme_name(scheme).to_string(),
        nx: case.grid.nx,
        ny: case.grid.ny,
        summary: RunOutcomeRecord {
            termination: outcome.termination.as_str().to_string(),
            iterations: outcome.iterations,
            time_s: outcome.time,
            residuals: finite_or_none(residuals),
            ratio: outcome.ratio.is_finite().then_some(outcome.ratio),
            error_norms: outcome.error_norms.as_ref().map(ErrorNormsRecord::from),
        },
    };
    store.save_manifest(&manifest)?;
    perf.save_time_s = save_timer.stop().unwrap_or_default();

    tracing::info!(
        run_id = %run_id,
        termination = %outcome.termination,
        iterations = outcome.iterations,
        total_s = perf.total_time_s(),
        "run saved"
    );
    emit_progress(&mut progress_cb, RunStage::Completed, started, None);

    Ok(RunSummary {
        run_dir: store.run_dir(&run_id),
        run_id,
        manifest,
        termination: outcome.termination,
        iterations: outcome.iterations,
        time: outcome.time,
        residuals,
        ratio: outcome.ratio,
        error_norms: outcome.error_norms,
        timing: RunTimingSummary::from(&perf),
        kernel_timing: cav_core::timing::is_enabled().then(kernel_timing::summary),
    })
}

/// Manifests of every run stored under `out_dir`, oldest first.
pub fn list_runs(out_dir: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::new(out_dir.to_path_buf())?;
    Ok(store.list_runs()?)
}

pub fn load_run(out_dir: &Path, run_id: &str) -> AppResult<RunManifest> {
    let store = RunStore::new(out_dir.to_path_buf())?;
    Ok(store.load_manifest(run_id)?)
}
