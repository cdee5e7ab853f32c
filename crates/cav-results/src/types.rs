//! Result data types.

use cav_core::{Field, Real};
use cav_solver::{
    ErrorNorms, FlowState, InitialStateProvider, NEQ, ProblemSetup, Snapshot, SolverError,
    SolverResult,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub case_name: String,
    pub timestamp: String,
    pub solver_version: String,
    pub mode: String,
    pub scheme: String,
    pub nx: usize,
    pub ny: usize,
    pub summary: RunOutcomeRecord,
}

/// How a run ended. Non-finite values are stored as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcomeRecord {
    pub termination: String,
    pub iterations: usize,
    pub time_s: Real,
    pub residuals: Option<[Real; NEQ]>,
    pub ratio: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_norms: Option<ErrorNormsRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ErrorNormsRecord {
    pub l1: [Real; NEQ],
    pub l2: [Real; NEQ],
    pub linf: [Real; NEQ],
}

impl From<&ErrorNorms> for ErrorNormsRecord {
    fn from(norms: &ErrorNorms) -> Self {
        Self {
            l1: norms.l1,
            l2: norms.l2,
            linf: norms.linf,
        }
    }
}

/// Everything needed to continue a run: iteration, time, normalizing
/// residuals and the primitive field in row-major `(i, j)` order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestartRecord {
    pub iteration: usize,
    pub time: Real,
    pub resinit: Option<[Real; NEQ]>,
    pub nx: usize,
    pub ny: usize,
    pub p: Vec<Real>,
    pub u: Vec<Real>,
    pub v: Vec<Real>,
}

impl RestartRecord {
    pub fn from_snapshot(snapshot: &Snapshot<'_>) -> Self {
        let field = snapshot.field;
        Self {
            iteration: snapshot.iteration,
            time: snapshot.time,
            resinit: snapshot.resinit.map(|r| [r[0], r[1], r[2]]),
            nx: field.ni(),
            ny: field.nj(),
            p: field.component(cav_solver::P),
            u: field.component(cav_solver::U),
            v: field.component(cav_solver::V),
        }
    }

    /// True when every stored value is finite (a record of a diverged run is not).
    pub fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.resinit.is_none_or(|r| r.iter().all(|x| x.is_finite()))
            && [&self.p, &self.u, &self.v]
                .iter()
                .all(|c| c.iter().all(|x| x.is_finite()))
    }
}

impl InitialStateProvider for RestartRecord {
    /// Continue after the recorded iteration.
    fn initial_state(&self, setup: &ProblemSetup) -> SolverResult<FlowState> {
        if self.nx != setup.nx || self.ny != setup.ny {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "restart record is {}x{}, case grid is {}x{}",
                    self.nx, self.ny, setup.nx, setup.ny
                ),
            });
        }
        let field = Field::from_components(self.nx, self.ny, &[&self.p, &self.u, &self.v])?;
        Ok(FlowState {
            iteration: self.iteration + 1,
            time: self.time,
            resinit: self.resinit.map(Vector3::from),
            field,
        })
    }
}
