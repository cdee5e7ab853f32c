//! Iterative residual norms and the convergence decision.

use crate::precond::beta_squared;
use crate::setup::{Numerics, ProblemSetup};
use crate::state::{P, U, V};
use cav_core::timing::{Timer, kernel_timing};
use cav_core::{Field, Real, pow2, rms};
use nalgebra::Vector3;

/// How the pseudo-time march ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Residual ratio fell below the tolerance
    Converged,
    /// A residual or the ratio became NaN or infinite
    Diverged,
    /// The iteration cap was reached first
    MaxIterationsReached,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::Diverged => "diverged",
            Termination::MaxIterationsReached => "max_iterations_reached",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RMS change per equation between `u_old` and `u`, scaled to residual units.
///
/// Continuity uses `(p - p_old) / (-beta^2 dt)` with beta^2 from the new
/// velocity, momentum uses `-rho (q - q_old) / dt`. Sums run over interior
/// nodes and are divided by the full node count.
pub fn compute_residuals(
    u: &Field,
    u_old: &Field,
    dt: &Field,
    setup: &ProblemSetup,
    numerics: &Numerics,
) -> Vector3<Real> {
    let timer = Timer::start("residuals");
    let mut sum = Vector3::zeros();
    for i in 1..setup.nx - 1 {
        for j in 1..setup.ny - 1 {
            let step = dt[(i, j)];
            let beta2 = beta_squared(u[(i, j, U)], u[(i, j, V)], numerics.rkappa, setup.vel2ref);
            let cont = (u[(i, j, P)] - u_old[(i, j, P)]) / (-beta2 * step);
            let xmtm = -setup.rho * (u[(i, j, U)] - u_old[(i, j, U)]) / step;
            let ymtm = -setup.rho * (u[(i, j, V)] - u_old[(i, j, V)]) / step;
            sum += Vector3::new(pow2(cont), pow2(xmtm), pow2(ymtm));
        }
    }
    let count = setup.node_count();
    let res = sum.map(|s| rms(s, count));
    timer.stop_into(&kernel_timing::MONITOR);
    res
}

/// Largest residual over the continuity normalization `|resinit[0]| / sqrt(nx*ny)`.
///
/// Returns NaN when any residual is non-finite so callers can classify it.
/// A zero or non-finite continuity normalization falls back to 1.
pub fn convergence_ratio(res: &Vector3<Real>, resinit: &Vector3<Real>, setup: &ProblemSetup) -> Real {
    if res.iter().any(|r| !r.is_finite()) {
        return Real::NAN;
    }
    let norm_init = rms(pow2(resinit[0]), setup.node_count());
    let norm_init = if norm_init.is_finite() && norm_init > 0.0 {
        norm_init
    } else {
        1.0
    };
    let largest = res[0].max(res[1]).max(res[2]);
    largest / norm_init
}

pub fn is_converged(ratio: Real, tolerance: Real) -> bool {
    ratio < tolerance
}

/// Classify one iteration's outcome; `None` means keep iterating.
pub fn classify(res: &Vector3<Real>, ratio: Real, tolerance: Real) -> Option<Termination> {
    if !ratio.is_finite() || res.iter().any(|r| !r.is_finite()) {
        Some(Termination::Diverged)
    } else if is_converged(ratio, tolerance) {
        Some(Termination::Converged)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{GridDims, PhysicalInputs};
    use crate::state::NEQ;

    fn setup() -> ProblemSetup {
        ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(5, 5)).unwrap()
    }

    #[test]
    fn unchanged_field_has_zero_residual() {
        let s = setup();
        let u = Field::filled(5, 5, NEQ, 0.3);
        let dt = Field::filled(5, 5, 1, 1e-3);
        let res = compute_residuals(&u, &u, &dt, &s, &Numerics::default());
        assert_eq!(res, Vector3::zeros());
    }

    #[test]
    fn single_node_change_is_normalized_by_all_nodes() {
        let s = setup();
        let old = Field::new(5, 5, NEQ);
        let mut new = old.clone();
        new[(2, 2, U)] = 0.1;
        let dt = Field::filled(5, 5, 1, 0.01);
        let res = compute_residuals(&new, &old, &dt, &s, &Numerics::default());
        // |rho * 0.1 / 0.01| = 10 at one node out of 25
        assert!((res[1] - (100.0f64 / 25.0).sqrt()).abs() < 1e-12);
        assert_eq!(res[0], 0.0);
        assert_eq!(res[2], 0.0);
    }

    #[test]
    fn boundary_changes_are_ignored() {
        let s = setup();
        let old = Field::new(5, 5, NEQ);
        let mut new = old.clone();
        new[(0, 2, P)] = 5.0;
        new[(4, 4, V)] = 5.0;
        let dt = Field::filled(5, 5, 1, 0.01);
        let res = compute_residuals(&new, &old, &dt, &s, &Numerics::default());
        assert_eq!(res, Vector3::zeros());
    }

    #[test]
    fn ratio_uses_continuity_normalization_only() {
        let s = setup();
        let resinit = Vector3::new(5.0, 1e6, 1e6);
        let res = Vector3::new(0.1, 0.2, 0.05);
        // 0.2 / (5 / 5)
        assert!((convergence_ratio(&res, &resinit, &s) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn zero_continuity_normalization_keeps_ratio_finite() {
        let s = setup();
        let resinit = Vector3::new(0.0, 3.0, 4.0);
        let res = Vector3::new(0.0, 0.2, 0.05);
        let ratio = convergence_ratio(&res, &resinit, &s);
        assert_eq!(ratio, 0.2);
        assert_eq!(classify(&res, ratio, 1e-6), None);
    }

    #[test]
    fn non_finite_residual_is_divergence() {
        let s = setup();
        let resinit = Vector3::new(1.0, 1.0, 1.0);
        let res = Vector3::new(0.1, Real::NAN, 0.05);
        let ratio = convergence_ratio(&res, &resinit, &s);
        assert!(ratio.is_nan());
        assert_eq!(classify(&res, ratio, 1e-6), Some(Termination::Diverged));

        let inf = Vector3::new(Real::INFINITY, 0.0, 0.0);
        assert_eq!(classify(&inf, convergence_ratio(&inf, &resinit, &s), 1e-6), Some(Termination::Diverged));
    }

    #[test]
    fn classify_converged_and_running() {
        let res = Vector3::new(1e-9, 1e-9, 1e-9);
        assert_eq!(classify(&res, 1e-9, 1e-6), Some(Termination::Converged));
        assert_eq!(classify(&res, 1e-3, 1e-6), None);
        assert!(!is_converged(Real::NAN, 1e-6));
    }
}
