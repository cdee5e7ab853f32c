//! Pressure level anchoring.
//!
//! Continuity fixes pressure only up to a constant; after every iteration the
//! whole pressure field is shifted so the cavity center holds the reference.

use crate::mms::ManufacturedSolution;
use crate::setup::ProblemSetup;
use crate::state::P;
use cav_core::{Field, Real};

/// Pressure the center node is pinned to: the manufactured pressure there when
/// an oracle is given, `pinf` otherwise.
pub fn reference_pressure(setup: &ProblemSetup, oracle: Option<&ManufacturedSolution>) -> Real {
    let (ic, jc) = setup.center();
    match oracle {
        Some(mms) => mms.exact(setup.x(ic), setup.y(jc), P),
        None => setup.pinf,
    }
}

/// Subtract `p(center) - reference` from every node and return the shift.
pub fn rescale_pressure(u: &mut Field, setup: &ProblemSetup, reference: Real) -> Real {
    let (ic, jc) = setup.center();
    let delta = u[(ic, jc, P)] - reference;
    u.map_component(P, |p| p - delta);
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{GridDims, PhysicalInputs};
    use crate::state::{NEQ, U};
    use proptest::prelude::*;

    #[test]
    fn manufactured_reference_is_center_pressure() {
        let s = ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(9, 9)).unwrap();
        let mms = ManufacturedSolution::new(&s);
        let reference = reference_pressure(&s, Some(&mms));
        assert!((reference - 0.801333844662).abs() < 1e-7, "reference = {reference}");
        let (ic, jc) = s.center();
        assert_eq!(reference, mms.exact(s.x(ic), s.y(jc), P));
        assert_eq!(reference_pressure(&s, None), s.pinf);
    }

    proptest! {
        #[test]
        fn center_holds_reference_after_rescale(
            n in prop::sample::select(vec![5usize, 9, 13]),
            reference in -10.0f64..10.0,
            offset in -1e3f64..1e3,
        ) {
            let s = ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(n, n)).unwrap();
            let mut u = Field::new(n, n, NEQ);
            for i in 0..n {
                for j in 0..n {
                    u[(i, j, P)] = offset + (i * n + j) as f64 * 0.01;
                    u[(i, j, U)] = 0.5;
                }
            }
            let before = u.clone();
            rescale_pressure(&mut u, &s, reference);
            let (ic, jc) = s.center();
            prop_assert!((u[(ic, jc, P)] - reference).abs() <= 1e-12 * (1.0 + offset.abs()));
            // differences and velocities are untouched
            let d_before = before[(1, 2, P)] - before[(0, 0, P)];
            let d_after = u[(1, 2, P)] - u[(0, 0, P)];
            prop_assert!((d_before - d_after).abs() < 1e-9);
            prop_assert_eq!(u[(2, 2, U)], 0.5);
        }
    }
}
