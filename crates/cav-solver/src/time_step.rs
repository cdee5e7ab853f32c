//! Local pseudo-time step.

use crate::precond::{beta_squared, eigenvalue};
use crate::setup::{DtMinPolicy, Numerics, ProblemSetup};
use crate::state::{U, V};
use cav_core::timing::{Timer, kernel_timing};
use cav_core::{Field, Real};

/// Fill `dt` on interior nodes with `cfl * min(dt_convective, dt_viscous)` and
/// return the step used to advance pseudo-time.
///
/// Boundary entries of `dt` are left untouched.
pub fn compute_time_step(
    u: &Field,
    dt: &mut Field,
    setup: &ProblemSetup,
    numerics: &Numerics,
) -> Real {
    let timer = Timer::start("time_step");
    let (nx, ny) = (setup.nx, setup.ny);
    let dx_min = setup.dx.min(setup.dy);
    // viscous limit is the same at every node
    let dt_visc = setup.dx * setup.dy / (4.0 * setup.nu());

    let mut last = Real::INFINITY;
    let mut smallest = Real::INFINITY;
    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            let (uvel, vvel) = (u[(i, j, U)], u[(i, j, V)]);
            let beta2 = beta_squared(uvel, vvel, numerics.rkappa, setup.vel2ref);
            let lambda_max = eigenvalue(uvel, beta2).max(eigenvalue(vvel, beta2));
            let dt_conv = dx_min / lambda_max;

            let local = numerics.cfl * dt_conv.min(dt_visc);
            dt[(i, j)] = local;
            last = local;
            smallest = smallest.min(local);
        }
    }
    timer.stop_into(&kernel_timing::TIME_STEP);

    match numerics.dtmin_policy {
        DtMinPolicy::LastNode => last,
        DtMinPolicy::GlobalMinimum => smallest,
    }
}
