//! Relaxation schemes: one call advances the field by one pseudo-time iteration.

use crate::boundary::BoundaryPolicy;
use crate::dissipation::compute_artificial_viscosity;
use crate::precond::beta_squared;
use crate::setup::{Numerics, ProblemSetup, Scheme};
use crate::state::{NEQ, P, U, V};
use cav_core::timing::{Timer, kernel_timing};
use cav_core::{Field, Real};
use rayon::prelude::*;

/// Read-only inputs shared by every sweep of one iteration.
pub struct SweepContext<'a> {
    pub setup: &'a ProblemSetup,
    pub numerics: &'a Numerics,
    /// Local time step per node
    pub dt: &'a Field,
    /// Source terms (zero unless manufactured)
    pub src: &'a Field,
    pub boundary: &'a dyn BoundaryPolicy,
}

/// Scratch fields owned by the solver and reused every iteration.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// Field at the start of the iteration after the scheme returns
    pub u_old: Field,
    pub viscx: Field,
    pub viscy: Field,
}

impl Workspace {
    pub fn new(setup: &ProblemSetup) -> Self {
        Self {
            u_old: Field::new(setup.nx, setup.ny, NEQ),
            viscx: Field::scalar(setup.nx, setup.ny),
            viscy: Field::scalar(setup.nx, setup.ny),
        }
    }
}

/// One pseudo-time iteration.
///
/// On return `work.u_old` holds the field as it was on entry and `u` holds the
/// relaxed field with boundary values applied.
pub trait RelaxationScheme: Send + Sync {
    fn name(&self) -> &'static str;

    fn iterate(&self, ctx: &SweepContext<'_>, u: &mut Field, work: &mut Workspace);
}

/// Build the scheme selected for a run.
pub fn scheme_for(scheme: Scheme, numerics: &Numerics) -> Box<dyn RelaxationScheme> {
    match scheme {
        Scheme::SymmetricGaussSeidel => Box::new(SymmetricGaussSeidel),
        Scheme::PointJacobi => Box::new(PointJacobi {
            parallel: numerics.parallel,
        }),
    }
}

/// Central-difference derivatives at one node.
#[derive(Clone, Copy, Debug)]
struct Stencil {
    dpdx: Real,
    dpdy: Real,
    dudx: Real,
    dudy: Real,
    dvdx: Real,
    dvdy: Real,
    lap_u: Real,
    lap_v: Real,
}

impl Stencil {
    #[inline]
    fn at(f: &Field, i: usize, j: usize, setup: &ProblemSetup) -> Self {
        let (dx, dy) = (setup.dx, setup.dy);
        let d1x = |k: usize| (f[(i + 1, j, k)] - f[(i - 1, j, k)]) / (2.0 * dx);
        let d1y = |k: usize| (f[(i, j + 1, k)] - f[(i, j - 1, k)]) / (2.0 * dy);
        let d2 = |k: usize| {
            let c = f[(i, j, k)];
            (f[(i + 1, j, k)] - 2.0 * c + f[(i - 1, j, k)]) / (dx * dx)
                + (f[(i, j + 1, k)] - 2.0 * c + f[(i, j - 1, k)]) / (dy * dy)
        };
        Self {
            dpdx: d1x(P),
            dpdy: d1y(P),
            dudx: d1x(U),
            dudy: d1y(U),
            dvdx: d1x(V),
            dvdy: d1y(V),
            lap_u: d2(U),
            lap_v: d2(V),
        }
    }
}

#[inline]
fn continuity(ctx: &SweepContext<'_>, d: &Stencil, vx: Real, vy: Real, i: usize, j: usize) -> Real {
    let rho = ctx.setup.rho;
    rho * d.dudx + rho * d.dvdy - vx - vy - ctx.src[(i, j, P)]
}

#[inline]
fn x_momentum(ctx: &SweepContext<'_>, d: &Stencil, uvel: Real, vvel: Real, i: usize, j: usize) -> Real {
    let s = ctx.setup;
    s.rho * uvel * d.dudx + s.rho * vvel * d.dudy + d.dpdx - s.rmu * d.lap_u - ctx.src[(i, j, U)]
}

#[inline]
fn y_momentum(ctx: &SweepContext<'_>, d: &Stencil, uvel: Real, vvel: Real, i: usize, j: usize) -> Real {
    let s = ctx.setup;
    s.rho * uvel * d.dvdx + s.rho * vvel * d.dvdy + d.dpdy - s.rmu * d.lap_v - ctx.src[(i, j, V)]
}

/// Symmetric Gauss-Seidel: forward then backward in-place sweep, each
/// followed by boundary reapplication.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymmetricGaussSeidel;

impl SymmetricGaussSeidel {
    /// Relax node `(i, j)` in place. Derivatives come from the field before the
    /// node changes; the y-momentum update sees the new x-velocity.
    #[inline]
    fn relax_node(ctx: &SweepContext<'_>, u: &mut Field, work: &Workspace, i: usize, j: usize) {
        let s = ctx.setup;
        let beta2 = beta_squared(u[(i, j, U)], u[(i, j, V)], ctx.numerics.rkappa, s.vel2ref);
        let dt = ctx.dt[(i, j)];
        let d = Stencil::at(u, i, j, s);

        let cont = continuity(ctx, &d, work.viscx[(i, j)], work.viscy[(i, j)], i, j);
        u[(i, j, P)] -= beta2 * dt * cont;

        let xmtm = x_momentum(ctx, &d, u[(i, j, U)], u[(i, j, V)], i, j);
        u[(i, j, U)] -= dt * s.rhoinv * xmtm;

        let ymtm = y_momentum(ctx, &d, u[(i, j, U)], u[(i, j, V)], i, j);
        u[(i, j, V)] -= dt * s.rhoinv * ymtm;
    }

    fn forward_sweep(ctx: &SweepContext<'_>, u: &mut Field, work: &Workspace) {
        let timer = Timer::start("sgs_forward");
        let (nx, ny) = (ctx.setup.nx, ctx.setup.ny);
        for j in 1..ny - 1 {
            for i in 1..nx - 1 {
                Self::relax_node(ctx, u, work, i, j);
            }
        }
        timer.stop_into(&kernel_timing::SWEEP);
    }

    fn backward_sweep(ctx: &SweepContext<'_>, u: &mut Field, work: &Workspace) {
        let timer = Timer::start("sgs_backward");
        let (nx, ny) = (ctx.setup.nx, ctx.setup.ny);
        for j in (1..ny - 1).rev() {
            for i in (1..nx - 1).rev() {
                Self::relax_node(ctx, u, work, i, j);
            }
        }
        timer.stop_into(&kernel_timing::SWEEP);
    }
}

fn apply_boundary(ctx: &SweepContext<'_>, u: &mut Field) {
    let timer = Timer::start("boundary");
    ctx.boundary.apply(u);
    timer.stop_into(&kernel_timing::BOUNDARY);
}

impl RelaxationScheme for SymmetricGaussSeidel {
    fn name(&self) -> &'static str {
        "symmetric Gauss-Seidel"
    }

    fn iterate(&self, ctx: &SweepContext<'_>, u: &mut Field, work: &mut Workspace) {
        u.copy_into(&mut work.u_old);

        compute_artificial_viscosity(u, &mut work.viscx, &mut work.viscy, ctx.setup, ctx.numerics);
        Self::forward_sweep(ctx, u, work);
        apply_boundary(ctx, u);

        compute_artificial_viscosity(u, &mut work.viscx, &mut work.viscy, ctx.setup, ctx.numerics);
        Self::backward_sweep(ctx, u, work);
        apply_boundary(ctx, u);
    }
}

/// Point-Jacobi: every node is updated from the previous iteration only, so
/// rows can be relaxed concurrently.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointJacobi {
    /// Relax rows on the rayon pool
    pub parallel: bool,
}

impl PointJacobi {
    #[inline]
    fn relax_node(ctx: &SweepContext<'_>, old: &Field, work: &Workspace, i: usize, j: usize) -> [Real; NEQ] {
        let s = ctx.setup;
        let (uvel, vvel) = (old[(i, j, U)], old[(i, j, V)]);
        let beta2 = beta_squared(uvel, vvel, ctx.numerics.rkappa, s.vel2ref);
        let dt = ctx.dt[(i, j)];
        let d = Stencil::at(old, i, j, s);

        let cont = continuity(ctx, &d, work.viscx[(i, j)], work.viscy[(i, j)], i, j);
        let xmtm = x_momentum(ctx, &d, uvel, vvel, i, j);
        let ymtm = y_momentum(ctx, &d, uvel, vvel, i, j);
        [
            old[(i, j, P)] - beta2 * dt * cont,
            uvel - dt * s.rhoinv * xmtm,
            vvel - dt * s.rhoinv * ymtm,
        ]
    }

    fn relax_row(ctx: &SweepContext<'_>, work: &Workspace, i: usize, row: &mut [Real]) {
        for j in 1..ctx.setup.ny - 1 {
            let new = Self::relax_node(ctx, &work.u_old, work, i, j);
            row[j * NEQ..(j + 1) * NEQ].copy_from_slice(&new);
        }
    }

    fn pass(&self, ctx: &SweepContext<'_>, u: &mut Field, work: &Workspace) {
        let timer = Timer::start("point_jacobi");
        let nx = ctx.setup.nx;
        let width = ctx.setup.ny * NEQ;

        if self.parallel {
            u.as_mut_slice()
                .par_chunks_mut(width)
                .enumerate()
                .filter(|(i, _)| *i > 0 && *i < nx - 1)
                .for_each(|(i, row)| Self::relax_row(ctx, work, i, row));
        } else {
            u.as_mut_slice()
                .chunks_mut(width)
                .enumerate()
                .filter(|(i, _)| *i > 0 && *i < nx - 1)
                .for_each(|(i, row)| Self::relax_row(ctx, work, i, row));
        }
        timer.stop_into(&kernel_timing::SWEEP);
    }
}

impl RelaxationScheme for PointJacobi {
    fn name(&self) -> &'static str {
        if self.parallel {
            "point Jacobi (parallel)"
        } else {
            "point Jacobi"
        }
    }

    fn iterate(&self, ctx: &SweepContext<'_>, u: &mut Field, work: &mut Workspace) {
        u.swap_storage(&mut work.u_old);
        compute_artificial_viscosity(
            &work.u_old,
            &mut work.viscx,
            &mut work.viscy,
            ctx.setup,
            ctx.numerics,
        );
        self.pass(ctx, u, work);
        apply_boundary(ctx, u);
    }
}
