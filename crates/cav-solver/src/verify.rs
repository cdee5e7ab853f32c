//! Discretization error against the manufactured solution.

use crate::mms::ManufacturedSolution;
use crate::setup::ProblemSetup;
use crate::state::NEQ;
use cav_core::{Field, Real};

/// L1, L2 and L-infinity error norms per component (p, u, v).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErrorNorms {
    pub l1: [Real; NEQ],
    pub l2: [Real; NEQ],
    pub linf: [Real; NEQ],
}

/// Compare interior nodes of `u` with the exact field. Sums are divided by the
/// full node count.
pub fn discretization_error_norms(
    u: &Field,
    setup: &ProblemSetup,
    exact: &ManufacturedSolution,
) -> ErrorNorms {
    let mut norms = ErrorNorms::default();
    let mut sum_sq = [0.0; NEQ];
    for i in 1..setup.nx - 1 {
        let x = setup.x(i);
        for j in 1..setup.ny - 1 {
            let y = setup.y(j);
            for k in 0..NEQ {
                let err = (u[(i, j, k)] - exact.exact(x, y, k)).abs();
                norms.l1[k] += err;
                sum_sq[k] += err * err;
                norms.linf[k] = norms.linf[k].max(err);
            }
        }
    }
    let count = setup.node_count() as Real;
    for k in 0..NEQ {
        norms.l1[k] /= count;
        norms.l2[k] = (sum_sq[k] / count).sqrt();
    }
    norms
}
