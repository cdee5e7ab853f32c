//! Artificial-compressibility preconditioning.

use cav_core::{Real, pow2};

/// Preconditioning parameter `beta^2 = max(u^2 + v^2, kappa * uref^2)`.
#[inline]
pub fn beta_squared(u: Real, v: Real, rkappa: Real, vel2ref: Real) -> Real {
    (pow2(u) + pow2(v)).max(rkappa * vel2ref)
}

/// Pseudo-acoustic eigenvalue along one direction with velocity component `c`.
#[inline]
pub fn eigenvalue(c: Real, beta2: Real) -> Real {
    0.5 * (c.abs() + (pow2(c) + 4.0 * beta2).sqrt())
}
