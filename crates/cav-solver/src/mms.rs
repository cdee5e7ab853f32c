//! Manufactured solution: closed-form exact field and the matching
//! source terms of the steady equations.
//!
//! Each component is `phi0 + phix*f(ax) + phiy*g(ay) + phixy*h(axy)` with
//! `ax = apx*pi*x/L`, `ay = apy*pi*y/L`, `axy = apxy*pi*x*y/L^2`, where each of
//! f, g, h is a sine or a cosine.

use crate::setup::ProblemSetup;
use crate::state::{NEQ, P, U, V};
use cav_core::{Field, Real};
use std::f64::consts::PI;

const PHI0: [Real; NEQ] = [0.25, 0.3, 0.2];
const PHIX: [Real; NEQ] = [0.5, 0.15, 1.0 / 6.0];
const PHIY: [Real; NEQ] = [0.4, 0.2, 0.25];
const PHIXY: [Real; NEQ] = [1.0 / 3.0, 0.25, 0.1];
const APX: [Real; NEQ] = [0.5, 1.0 / 3.0, 7.0 / 17.0];
const APY: [Real; NEQ] = [0.2, 0.25, 1.0 / 6.0];
const APXY: [Real; NEQ] = [2.0 / 7.0, 0.4, 1.0 / 3.0];
// true = sine, false = cosine
const SINX: [bool; NEQ] = [false, true, false];
const SINY: [bool; NEQ] = [true, false, false];
const SINXY: [bool; NEQ] = [true, true, false];

/// Value and derivatives of one manufactured component at a point.
#[derive(Clone, Copy, Debug, Default)]
pub struct Derivatives {
    pub value: Real,
    pub dx: Real,
    pub dy: Real,
    pub dxx: Real,
    pub dyy: Real,
}

#[inline]
fn trig(sine: bool, arg: Real) -> (Real, Real) {
    // (f, f') for f = sin or cos; f'' = -f for both
    if sine {
        (arg.sin(), arg.cos())
    } else {
        (arg.cos(), -arg.sin())
    }
}

/// Exact-solution and forcing oracle.
#[derive(Clone, Debug)]
pub struct ManufacturedSolution {
    rho: Real,
    rmu: Real,
    rlength: Real,
}

impl ManufacturedSolution {
    pub fn new(setup: &ProblemSetup) -> Self {
        Self {
            rho: setup.rho,
            rmu: setup.rmu,
            rlength: setup.rlength,
        }
    }

    /// Value and first/second derivatives of component `k` at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= NEQ`.
    pub fn derivatives(&self, x: Real, y: Real, k: usize) -> Derivatives {
        let l = self.rlength;
        let kx = APX[k] * PI / l;
        let ky = APY[k] * PI / l;
        let kxy = APXY[k] * PI / (l * l);

        let (fx, dfx) = trig(SINX[k], kx * x);
        let (fy, dfy) = trig(SINY[k], ky * y);
        let (fxy, dfxy) = trig(SINXY[k], kxy * x * y);

        Derivatives {
            value: PHI0[k] + PHIX[k] * fx + PHIY[k] * fy + PHIXY[k] * fxy,
            dx: PHIX[k] * kx * dfx + PHIXY[k] * kxy * y * dfxy,
            dy: PHIY[k] * ky * dfy + PHIXY[k] * kxy * x * dfxy,
            dxx: -PHIX[k] * kx * kx * fx - PHIXY[k] * (kxy * y).powi(2) * fxy,
            dyy: -PHIY[k] * ky * ky * fy - PHIXY[k] * (kxy * x).powi(2) * fxy,
        }
    }

    /// Exact value of component `k` (0 = p, 1 = u, 2 = v).
    ///
    /// # Panics
    ///
    /// Panics if `k >= NEQ`.
    pub fn exact(&self, x: Real, y: Real, k: usize) -> Real {
        self.derivatives(x, y, k).value
    }

    /// Source term of equation `k` (0 = continuity, 1 = x-momentum, 2 = y-momentum)
    /// that makes the exact field a steady solution.
    ///
    /// # Panics
    ///
    /// Panics if `k >= NEQ`.
    pub fn forcing(&self, x: Real, y: Real, k: usize) -> Real {
        let p = self.derivatives(x, y, P);
        let u = self.derivatives(x, y, U);
        let v = self.derivatives(x, y, V);
        let rho = self.rho;
        match k {
            0 => rho * u.dx + rho * v.dy,
            1 => {
                rho * u.value * u.dx + rho * v.value * u.dy + p.dx - self.rmu * (u.dxx + u.dyy)
            }
            2 => {
                rho * u.value * v.dx + rho * v.value * v.dy + p.dy - self.rmu * (v.dxx + v.dyy)
            }
            _ => panic!("equation index {k} out of range"),
        }
    }

    /// Exact field sampled on every node of the grid.
    pub fn exact_field(&self, setup: &ProblemSetup) -> Field {
        let mut field = Field::new(setup.nx, setup.ny, NEQ);
        for i in 0..setup.nx {
            let x = setup.x(i);
            for j in 0..setup.ny {
                let y = setup.y(j);
                for k in 0..NEQ {
                    field[(i, j, k)] = self.exact(x, y, k);
                }
            }
        }
        field
    }
}

/// Source field for a run: forcing on interior nodes when `oracle` is given,
/// identically zero otherwise.
pub fn source_field(setup: &ProblemSetup, oracle: Option<&ManufacturedSolution>) -> Field {
    let mut src = Field::new(setup.nx, setup.ny, NEQ);
    if let Some(mms) = oracle {
        for i in 1..setup.nx - 1 {
            let x = setup.x(i);
            for j in 1..setup.ny - 1 {
                let y = setup.y(j);
                for k in 0..NEQ {
                    src[(i, j, k)] = mms.forcing(x, y, k);
                }
            }
        }
    }
    src
}
