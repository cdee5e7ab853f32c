//! Pseudo-time control loop.

use crate::anchor::{reference_pressure, rescale_pressure};
use crate::boundary::{BoundaryPolicy, CavityWalls, ManufacturedBoundary};
use crate::convergence::{Termination, classify, compute_residuals, convergence_ratio};
use crate::error::{SolverError, SolverResult};
use crate::mms::{ManufacturedSolution, source_field};
use crate::relax::{RelaxationScheme, SweepContext, Workspace, scheme_for};
use crate::setup::{Mode, Numerics, ProblemSetup, Scheme};
use crate::sink::{OutputSink, Snapshot};
use crate::state::FlowState;
use crate::time_step::compute_time_step;
use crate::verify::{ErrorNorms, discretization_error_norms};
use cav_core::{Field, Real};
use nalgebra::Vector3;

/// Result of one call to [`Solver::run_iteration`].
#[derive(Clone, Copy, Debug)]
pub struct IterationReport {
    pub iteration: usize,
    pub res: Vector3<Real>,
    pub ratio: Real,
    pub dtmin: Real,
}

/// Emitted once per iteration to an optional progress callback.
#[derive(Clone, Copy, Debug)]
pub struct SolveProgressEvent {
    pub iteration: usize,
    pub time: Real,
    pub ratio: Real,
    pub res: Vector3<Real>,
}

/// Outcome of [`Solver::run`].
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub termination: Termination,
    /// Last iteration executed
    pub iterations: usize,
    pub time: Real,
    pub residuals: Vector3<Real>,
    pub ratio: Real,
    /// Error against the manufactured solution (manufactured mode only)
    pub error_norms: Option<ErrorNorms>,
}

/// Owns the fields of one run and advances them iteration by iteration.
pub struct Solver {
    setup: ProblemSetup,
    numerics: Numerics,
    mode: Mode,
    scheme: Box<dyn RelaxationScheme>,
    boundary: Box<dyn BoundaryPolicy>,
    oracle: Option<ManufacturedSolution>,
    reference_p: Real,

    u: Field,
    work: Workspace,
    dt: Field,
    src: Field,

    /// Next iteration to execute
    iteration: usize,
    first_iteration: usize,
    time: Real,
    resinit: Option<Vector3<Real>>,
}

impl Solver {
    /// Build a solver from a validated setup and an initial state. Boundary
    /// values are applied to the initial field before the first iteration.
    pub fn new(
        setup: ProblemSetup,
        numerics: Numerics,
        mode: Mode,
        scheme: Scheme,
        initial: FlowState,
    ) -> SolverResult<Self> {
        numerics.validate()?;
        initial.check_shape(&setup)?;
        if initial.iteration == 0 {
            return Err(SolverError::InvalidState {
                what: "iterations are numbered from 1".to_string(),
            });
        }

        let oracle = match mode {
            Mode::Manufactured => Some(ManufacturedSolution::new(&setup)),
            Mode::Cavity => None,
        };
        let boundary: Box<dyn BoundaryPolicy> = match mode {
            Mode::Manufactured => Box::new(ManufacturedBoundary::new(&setup)),
            Mode::Cavity => Box::new(CavityWalls::new(&setup)),
        };
        let src = source_field(&setup, oracle.as_ref());
        let reference_p = reference_pressure(&setup, oracle.as_ref());
        let scheme = scheme_for(scheme, &numerics);

        let mut u = initial.field;
        boundary.apply(&mut u);

        tracing::info!(
            scheme = scheme.name(),
            boundary = boundary.name(),
            start = initial.iteration,
            "solver ready"
        );

        Ok(Self {
            work: Workspace::new(&setup),
            dt: Field::scalar(setup.nx, setup.ny),
            setup,
            numerics,
            mode,
            scheme,
            boundary,
            oracle,
            reference_p,
            u,
            src,
            iteration: initial.iteration,
            first_iteration: initial.iteration,
            time: initial.time,
            resinit: initial.resinit,
        })
    }

    pub fn setup(&self) -> &ProblemSetup {
        &self.setup
    }

    pub fn numerics(&self) -> &Numerics {
        &self.numerics
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current field (p, u, v).
    pub fn field(&self) -> &Field {
        &self.u
    }

    /// Local time step from the latest estimate.
    pub fn dt_field(&self) -> &Field {
        &self.dt
    }

    pub fn source(&self) -> &Field {
        &self.src
    }

    pub fn oracle(&self) -> Option<&ManufacturedSolution> {
        self.oracle.as_ref()
    }

    /// Iteration the next call to [`Self::run_iteration`] executes.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn time(&self) -> Real {
        self.time
    }

    pub fn resinit(&self) -> Option<Vector3<Real>> {
        self.resinit
    }

    pub fn snapshot(&self, iteration: usize) -> Snapshot<'_> {
        Snapshot {
            iteration,
            time: self.time,
            resinit: self.resinit,
            field: &self.u,
            dt: &self.dt,
            setup: &self.setup,
            exact: self.oracle.as_ref(),
        }
    }

    /// Advance one iteration: time step, relaxation, pressure anchor, then
    /// residual norms of the change.
    pub fn run_iteration(&mut self) -> IterationReport {
        let dtmin = compute_time_step(&self.u, &mut self.dt, &self.setup, &self.numerics);

        let ctx = SweepContext {
            setup: &self.setup,
            numerics: &self.numerics,
            dt: &self.dt,
            src: &self.src,
            boundary: self.boundary.as_ref(),
        };
        self.scheme.iterate(&ctx, &mut self.u, &mut self.work);

        rescale_pressure(&mut self.u, &self.setup, self.reference_p);
        self.time += dtmin;

        let res = compute_residuals(&self.u, &self.work.u_old, &self.dt, &self.setup, &self.numerics);
        // a fresh Jacobi pass leaves p untouched, so wait for a continuity residual
        if self.resinit.is_none() && res[0] > 0.0 && res.iter().all(|r| r.is_finite()) {
            self.resinit = Some(res);
        }
        let resinit = self.resinit.unwrap_or_else(|| Vector3::repeat(1.0));
        let ratio = convergence_ratio(&res, &resinit, &self.setup);

        let report = IterationReport {
            iteration: self.iteration,
            res,
            ratio,
            dtmin,
        };
        self.iteration += 1;
        report
    }

    /// Iterate until converged, diverged or past `max_iterations`, reporting to
    /// `sink` at the configured cadences.
    pub fn run(
        &mut self,
        sink: &mut dyn OutputSink,
        mut progress: Option<&mut dyn FnMut(SolveProgressEvent)>,
    ) -> SolverResult<SolveOutcome> {
        let max = self.numerics.max_iterations;
        let mut termination = Termination::MaxIterationsReached;
        let mut last: Option<IterationReport> = None;

        while self.iteration <= max {
            let report = self.run_iteration();
            let n = report.iteration;
            let outcome = classify(&report.res, report.ratio, self.numerics.toler);

            if n % self.numerics.residual_out == 0 || n == self.first_iteration || outcome.is_some() {
                sink.record_residuals(n, self.time, report.dtmin, &report.res)?;
                tracing::info!(
                    iteration = n,
                    time = self.time,
                    dtmin = report.dtmin,
                    continuity = report.res[0],
                    x_momentum = report.res[1],
                    y_momentum = report.res[2],
                    "residuals"
                );
            }
            tracing::debug!(iteration = n, ratio = report.ratio, "convergence ratio");

            if let Some(cb) = progress.as_deref_mut() {
                cb(SolveProgressEvent {
                    iteration: n,
                    time: self.time,
                    ratio: report.ratio,
                    res: report.res,
                });
            }

            last = Some(report);
            if let Some(done) = outcome {
                termination = done;
                break;
            }
            if n % self.numerics.iterout == 0 {
                sink.write_snapshot(&self.snapshot(n))?;
            }
        }

        let (iterations, residuals, ratio) = match last {
            Some(r) => (r.iteration, r.res, r.ratio),
            None => (self.iteration.saturating_sub(1), Vector3::zeros(), Real::NAN),
        };
        sink.write_snapshot(&self.snapshot(iterations))?;

        let error_norms = self
            .oracle
            .as_ref()
            .map(|exact| discretization_error_norms(&self.u, &self.setup, exact));

        match termination {
            Termination::Diverged => tracing::warn!(iteration = iterations, "solution diverged"),
            other => tracing::info!(iteration = iterations, ratio, termination = %other, "finished"),
        }
        if let Some(norms) = &error_norms {
            tracing::info!(l1 = ?norms.l1, l2 = ?norms.l2, linf = ?norms.linf, "discretization error");
        }

        Ok(SolveOutcome {
            termination,
            iterations,
            time: self.time,
            residuals,
            ratio,
            error_norms,
        })
    }
}
