//! Fourth-order artificial dissipation for the continuity equation.
//!
//! The five-point stencil covers nodes at least two cells from every wall.
//! The ring one cell in from the walls is filled by linear extrapolation
//! along the wall normal: first the left and right columns, then the bottom
//! and top rows (corners of the ring take the row value).

use crate::precond::{beta_squared, eigenvalue};
use crate::setup::{Numerics, ProblemSetup};
use crate::state::{P, U, V};
use cav_core::Field;
use cav_core::timing::{Timer, kernel_timing};

/// Fill `viscx` and `viscy` on all interior nodes from the pressure of `u`.
pub fn compute_artificial_viscosity(
    u: &Field,
    viscx: &mut Field,
    viscy: &mut Field,
    setup: &ProblemSetup,
    numerics: &Numerics,
) {
    let timer = Timer::start("dissipation");
    let (nx, ny) = (setup.nx, setup.ny);

    for i in 2..=nx - 3 {
        for j in 2..=ny - 3 {
            let (uvel, vvel) = (u[(i, j, U)], u[(i, j, V)]);
            let beta2 = beta_squared(uvel, vvel, numerics.rkappa, setup.vel2ref);
            let lambda_x = eigenvalue(uvel, beta2);
            let lambda_y = eigenvalue(vvel, beta2);

            let d4px = (u[(i + 2, j, P)] - 4.0 * u[(i + 1, j, P)] + 6.0 * u[(i, j, P)]
                - 4.0 * u[(i - 1, j, P)]
                + u[(i - 2, j, P)])
                / setup.dx;
            let d4py = (u[(i, j + 2, P)] - 4.0 * u[(i, j + 1, P)] + 6.0 * u[(i, j, P)]
                - 4.0 * u[(i, j - 1, P)]
                + u[(i, j - 2, P)])
                / setup.dy;

            viscx[(i, j)] = -lambda_x.abs() * numerics.cx * d4px / beta2;
            viscy[(i, j)] = -lambda_y.abs() * numerics.cy * d4py / beta2;
        }
    }

    for visc in [&mut *viscx, &mut *viscy] {
        extrapolate_ring(visc, nx, ny);
    }
    timer.stop_into(&kernel_timing::DISSIPATION);
}

/// Value one cell in from a wall given the two nearest stencil values.
/// Grids with a single stencil node along the direction copy it.
#[inline]
fn edge_value(nearest: f64, next: Option<f64>) -> f64 {
    match next {
        Some(next) => 2.0 * nearest - next,
        None => nearest,
    }
}

fn extrapolate_ring(visc: &mut Field, nx: usize, ny: usize) {
    let wide_x = nx > 5;
    let wide_y = ny > 5;

    for j in 2..=ny - 3 {
        visc[(1, j)] = edge_value(visc[(2, j)], wide_x.then(|| visc[(3, j)]));
        visc[(nx - 2, j)] = edge_value(visc[(nx - 3, j)], wide_x.then(|| visc[(nx - 4, j)]));
    }
    for i in 1..=nx - 2 {
        visc[(i, 1)] = edge_value(visc[(i, 2)], wide_y.then(|| visc[(i, 3)]));
        visc[(i, ny - 2)] = edge_value(visc[(i, ny - 3)], wide_y.then(|| visc[(i, ny - 4)]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{GridDims, PhysicalInputs};
    use crate::state::{FlowState, NEQ};

    fn setup(nx: usize, ny: usize) -> ProblemSetup {
        ProblemSetup::new(&PhysicalInputs::default(), GridDims::new(nx, ny)).unwrap()
    }

    #[test]
    fn uniform_pressure_gives_no_damping() {
        let s = setup(11, 11);
        let state = FlowState::fresh(&s);
        let mut vx = Field::filled(11, 11, 1, 9.0);
        let mut vy = Field::filled(11, 11, 1, 9.0);
        compute_artificial_viscosity(&state.field, &mut vx, &mut vy, &s, &Numerics::default());
        for i in 1..10 {
            for j in 1..10 {
                assert_eq!(vx[(i, j)], 0.0);
                assert_eq!(vy[(i, j)], 0.0);
            }
        }
        // walls untouched
        assert_eq!(vx[(0, 0)], 9.0);
    }

    #[test]
    fn cubic_pressure_is_not_damped() {
        // fourth difference of a cubic vanishes
        let s = setup(9, 9);
        let mut u = Field::new(9, 9, NEQ);
        for i in 0..9 {
            for j in 0..9 {
                let (x, y) = (i as f64, j as f64);
                u[(i, j, P)] = x * x * x - 2.0 * y * y * y + x * y;
            }
        }
        let mut vx = Field::scalar(9, 9);
        let mut vy = Field::scalar(9, 9);
        compute_artificial_viscosity(&u, &mut vx, &mut vy, &s, &Numerics::default());
        for i in 1..8 {
            for j in 1..8 {
                assert!(vx[(i, j)].abs() < 1e-9, "vx({i},{j}) = {}", vx[(i, j)]);
                assert!(vy[(i, j)].abs() < 1e-9, "vy({i},{j}) = {}", vy[(i, j)]);
            }
        }
    }

    #[test]
    fn ring_is_linear_extrapolation_in_each_buffer() {
        let s = setup(11, 11);
        let mut u = Field::new(11, 11, NEQ);
        for i in 0..11 {
            for j in 0..11 {
                let (x, y) = (i as f64, j as f64);
                u[(i, j, P)] = 1e-3 * (x.powi(5) + 0.5 * y.powi(4) * x);
            }
        }
        let mut vx = Field::scalar(11, 11);
        let mut vy = Field::scalar(11, 11);
        compute_artificial_viscosity(&u, &mut vx, &mut vy, &s, &Numerics::default());

        for visc in [&vx, &vy] {
            for j in 2..=8 {
                assert_eq!(visc[(1, j)], 2.0 * visc[(2, j)] - visc[(3, j)]);
                assert_eq!(visc[(9, j)], 2.0 * visc[(8, j)] - visc[(7, j)]);
            }
            for i in 1..=9 {
                assert_eq!(visc[(i, 1)], 2.0 * visc[(i, 2)] - visc[(i, 3)]);
                assert_eq!(visc[(i, 9)], 2.0 * visc[(i, 8)] - visc[(i, 7)]);
            }
        }
        // x and y damping differ for this pressure, so the buffers stay separate
        assert_ne!(vx[(5, 5)], vy[(5, 5)]);
        assert_ne!(vx[(1, 5)], vy[(1, 5)]);
    }

    #[test]
    fn smallest_grid_copies_the_single_stencil_node() {
        let s = setup(5, 5);
        let mut u = Field::new(5, 5, NEQ);
        for i in 0..5 {
            for j in 0..5 {
                u[(i, j, P)] = ((i * i * i * i + 3 * j * j * j * j) as f64) * 1e-2;
            }
        }
        let mut vx = Field::scalar(5, 5);
        let mut vy = Field::scalar(5, 5);
        compute_artificial_viscosity(&u, &mut vx, &mut vy, &s, &Numerics::default());
        let centre = vx[(2, 2)];
        assert_ne!(centre, 0.0);
        for i in 1..=3 {
            for j in 1..=3 {
                assert_eq!(vx[(i, j)], centre);
            }
        }
    }
}
