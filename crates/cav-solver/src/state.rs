//! Primitive-variable state and where it comes from at startup.

use crate::error::{SolverError, SolverResult};
use crate::setup::ProblemSetup;
use cav_core::{Field, Real};
use nalgebra::Vector3;

/// Pressure component index.
pub const P: usize = 0;
/// x-velocity component index.
pub const U: usize = 1;
/// y-velocity component index.
pub const V: usize = 2;
/// Equations per node: continuity, x-momentum, y-momentum.
pub const NEQ: usize = 3;

/// Starting point of a run: `(iteration, time, resinit, U)`.
#[derive(Clone, Debug)]
pub struct FlowState {
    /// Iteration number the loop starts at
    pub iteration: usize,
    /// Accumulated pseudo-time
    pub time: Real,
    /// Normalizing residuals; `None` until captured on the first iteration
    pub resinit: Option<Vector3<Real>>,
    /// Node values (p, u, v)
    pub field: Field,
}

impl FlowState {
    /// Quiescent cavity at reference pressure with the lid row moving.
    pub fn fresh(setup: &ProblemSetup) -> Self {
        let mut field = Field::new(setup.nx, setup.ny, NEQ);
        for i in 0..setup.nx {
            for j in 0..setup.ny {
                field[(i, j, P)] = setup.pinf;
            }
            field[(i, setup.ny - 1, U)] = setup.uinf;
        }
        Self {
            iteration: 1,
            time: 0.0,
            resinit: None,
            field,
        }
    }

    /// Check the state fits the grid of `setup`.
    pub fn check_shape(&self, setup: &ProblemSetup) -> SolverResult<()> {
        let shape = self.field.shape();
        if shape.ni != setup.nx || shape.nj != setup.ny || shape.nk != NEQ {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "state is {}x{}x{}, case needs {}x{}x{}",
                    shape.ni, shape.nj, shape.nk, setup.nx, setup.ny, NEQ
                ),
            });
        }
        Ok(())
    }
}

/// Supplies the initial state of a run (fresh start or restart).
pub trait InitialStateProvider {
    fn initial_state(&self, setup: &ProblemSetup) -> SolverResult<FlowState>;
}

/// Start from the quiescent cavity.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreshStart;

impl InitialStateProvider for FreshStart {
    fn initial_state(&self, setup: &ProblemSetup) -> SolverResult<FlowState> {
        Ok(FlowState::fresh(setup))
    }
}
