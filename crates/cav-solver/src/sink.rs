//! Output collaborator invoked by the control loop.

use crate::error::SolverResult;
use crate::mms::ManufacturedSolution;
use crate::setup::ProblemSetup;
use cav_core::{Field, Real};
use nalgebra::Vector3;

/// Read-only view of the solver at one iteration.
pub struct Snapshot<'a> {
    pub iteration: usize,
    pub time: Real,
    /// Normalizing residuals, once captured
    pub resinit: Option<Vector3<Real>>,
    pub field: &'a Field,
    /// Local time step of the last estimate
    pub dt: &'a Field,
    pub setup: &'a ProblemSetup,
    /// Present in manufactured mode, for exact-solution columns
    pub exact: Option<&'a ManufacturedSolution>,
}

/// Receives residual history records and field snapshots.
pub trait OutputSink {
    fn record_residuals(
        &mut self,
        iteration: usize,
        time: Real,
        dtmin: Real,
        res: &Vector3<Real>,
    ) -> SolverResult<()>;

    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> SolverResult<()>;
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn record_residuals(&mut self, _: usize, _: Real, _: Real, _: &Vector3<Real>) -> SolverResult<()> {
        Ok(())
    }

    fn write_snapshot(&mut self, _: &Snapshot<'_>) -> SolverResult<()> {
        Ok(())
    }
}

/// Keeps residual records and snapshot iterations in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub residuals: Vec<(usize, Real, Vector3<Real>)>,
    pub snapshots: Vec<usize>,
}

impl OutputSink for MemorySink {
    fn record_residuals(
        &mut self,
        iteration: usize,
        time: Real,
        _dtmin: Real,
        res: &Vector3<Real>,
    ) -> SolverResult<()> {
        self.residuals.push((iteration, time, *res));
        Ok(())
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> SolverResult<()> {
        self.snapshots.push(snapshot.iteration);
        Ok(())
    }
}
