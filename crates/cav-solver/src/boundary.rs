//! Boundary condition policies.
//!
//! Side walls are written first, then the bottom and top rows including the
//! corners, so corner values come from the horizontal walls.

use crate::mms::ManufacturedSolution;
use crate::setup::ProblemSetup;
use crate::state::{NEQ, P, U, V};
use cav_core::Field;

/// Writes boundary values of the flow field from its current interior.
pub trait BoundaryPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, u: &mut Field);
}

#[inline]
fn extrapolate(adjacent: f64, next: f64) -> f64 {
    2.0 * adjacent - next
}

/// No-slip walls with a lid moving at `uinf` along the top.
#[derive(Clone, Debug)]
pub struct CavityWalls {
    nx: usize,
    ny: usize,
    uinf: f64,
}

impl CavityWalls {
    pub fn new(setup: &ProblemSetup) -> Self {
        Self {
            nx: setup.nx,
            ny: setup.ny,
            uinf: setup.uinf,
        }
    }
}

impl BoundaryPolicy for CavityWalls {
    fn name(&self) -> &'static str {
        "cavity walls"
    }

    fn apply(&self, u: &mut Field) {
        let (nx, ny) = (self.nx, self.ny);

        for j in 0..ny {
            u[(0, j, U)] = 0.0;
            u[(0, j, V)] = 0.0;
            u[(0, j, P)] = extrapolate(u[(1, j, P)], u[(2, j, P)]);

            u[(nx - 1, j, U)] = 0.0;
            u[(nx - 1, j, V)] = 0.0;
            u[(nx - 1, j, P)] = extrapolate(u[(nx - 2, j, P)], u[(nx - 3, j, P)]);
        }

        for i in 0..nx {
            u[(i, 0, U)] = 0.0;
            u[(i, 0, V)] = 0.0;
            u[(i, 0, P)] = extrapolate(u[(i, 1, P)], u[(i, 2, P)]);

            u[(i, ny - 1, U)] = self.uinf;
            u[(i, ny - 1, V)] = 0.0;
            u[(i, ny - 1, P)] = extrapolate(u[(i, ny - 2, P)], u[(i, ny - 3, P)]);
        }
    }
}

/// Exact manufactured values on every edge, with pressure re-extrapolated
/// from the interior.
#[derive(Clone, Debug)]
pub struct ManufacturedBoundary {
    setup: ProblemSetup,
    exact: ManufacturedSolution,
}

impl ManufacturedBoundary {
    pub fn new(setup: &ProblemSetup) -> Self {
        Self {
            setup: setup.clone(),
            exact: ManufacturedSolution::new(setup),
        }
    }

    fn set_exact(&self, u: &mut Field, i: usize, j: usize, x: f64, y: f64) {
        for k in 0..NEQ {
            u[(i, j, k)] = self.exact.exact(x, y, k);
        }
    }
}

impl BoundaryPolicy for ManufacturedBoundary {
    fn name(&self) -> &'static str {
        "manufactured solution"
    }

    fn apply(&self, u: &mut Field) {
        let s = &self.setup;
        let (nx, ny) = (s.nx, s.ny);

        for j in 1..ny - 1 {
            let y = s.y(j);
            self.set_exact(u, 0, j, s.xmin, y);
            u[(0, j, P)] = extrapolate(u[(1, j, P)], u[(2, j, P)]);

            self.set_exact(u, nx - 1, j, s.xmax, y);
            u[(nx - 1, j, P)] = extrapolate(u[(nx - 2, j, P)], u[(nx - 3, j, P)]);
        }

        for i in 0..nx {
            let x = s.x(i);
            self.set_exact(u, i, 0, x, s.ymin);
            u[(i, 0, P)] = extrapolate(u[(i, 1, P)], u[(i, 2, P)]);

            self.set_exact(u, i, ny - 1, x, s.ymax);
            u[(i, ny - 1, P)] = extrapolate(u[(i, ny - 2, P)], u[(i, ny - 3, P)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{GridDims, PhysicalInputs};
    use proptest::prelude::*;

    fn setup(n: usize) -> ProblemSetup {
        ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(n, n)).unwrap()
    }

    fn noisy_field(n: usize, seed: f64) -> Field {
        let mut f = Field::new(n, n, NEQ);
        for i in 0..n {
            for j in 0..n {
                for k in 0..NEQ {
                    f[(i, j, k)] = (seed * (1.0 + i as f64) + 0.37 * j as f64 + k as f64).sin();
                }
            }
        }
        f
    }

    #[test]
    fn cavity_walls_set_lid_and_no_slip() {
        let s = setup(7);
        let mut f = noisy_field(7, 0.3);
        CavityWalls::new(&s).apply(&mut f);
        for i in 0..7 {
            assert_eq!(f[(i, 6, U)], 1.0);
            assert_eq!(f[(i, 6, V)], 0.0);
            assert_eq!(f[(i, 0, U)], 0.0);
        }
        for j in 0..6 {
            assert_eq!(f[(0, j, U)], 0.0);
            assert_eq!(f[(6, j, V)], 0.0);
        }
        assert_eq!(f[(0, 3, P)], 2.0 * f[(1, 3, P)] - f[(2, 3, P)]);
        assert_eq!(f[(3, 6, P)], 2.0 * f[(3, 5, P)] - f[(3, 4, P)]);
    }

    #[test]
    fn cavity_walls_leave_interior_alone() {
        let s = setup(7);
        let before = noisy_field(7, 0.9);
        let mut f = before.clone();
        CavityWalls::new(&s).apply(&mut f);
        for i in 1..6 {
            for j in 1..6 {
                for k in 0..NEQ {
                    assert_eq!(f[(i, j, k)], before[(i, j, k)]);
                }
            }
        }
    }

    #[test]
    fn manufactured_boundary_uses_exact_velocity() {
        let s = setup(9);
        let mms = ManufacturedSolution::new(&s);
        let mut f = noisy_field(9, 1.3);
        ManufacturedBoundary::new(&s).apply(&mut f);
        let (x, y) = (s.x(4), s.ymax);
        assert_eq!(f[(4, 8, U)], mms.exact(x, y, U));
        assert_eq!(f[(4, 8, V)], mms.exact(x, y, V));
        assert_eq!(f[(4, 8, P)], 2.0 * f[(4, 7, P)] - f[(4, 6, P)]);
        assert_eq!(f[(0, 3, U)], mms.exact(s.xmin, s.y(3), U));
    }

    proptest! {
        #[test]
        fn policies_are_idempotent(n in prop::sample::select(vec![5usize, 7, 9, 11]), seed in 0.1f64..5.0) {
            let s = setup(n);
            let policies: [Box<dyn BoundaryPolicy>; 2] =
                [Box::new(CavityWalls::new(&s)), Box::new(ManufacturedBoundary::new(&s))];
            for policy in &policies {
                let mut once = noisy_field(n, seed);
                policy.apply(&mut once);
                let mut twice = once.clone();
                policy.apply(&mut twice);
                prop_assert_eq!(&once, &twice, "{} not idempotent", policy.name());
            }
        }
    }
}
