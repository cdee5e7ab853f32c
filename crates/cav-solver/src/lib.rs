//! Artificial-compressibility pseudo-time solver for the lid-driven cavity.
//!
//! The unknowns are pressure and the two velocity components on a uniform
//! structured grid. Each iteration estimates a local time step, relaxes the
//! field with symmetric Gauss-Seidel or point Jacobi sweeps, re-applies the
//! boundary policy, pins the pressure level at the cavity center and
//! measures the iterative residual. A manufactured-solution mode forces the
//! equations toward a known exact field for order-of-accuracy checks.

pub mod anchor;
pub mod boundary;
pub mod convergence;
pub mod dissipation;
pub mod error;
pub mod mms;
pub mod precond;
pub mod relax;
pub mod setup;
pub mod sink;
pub mod solve;
pub mod state;
pub mod time_step;
pub mod verify;

pub use boundary::{BoundaryPolicy, CavityWalls, ManufacturedBoundary};
pub use convergence::{Termination, compute_residuals, convergence_ratio, is_converged};
pub use error::{SolverError, SolverResult};
pub use mms::ManufacturedSolution;
pub use relax::{PointJacobi, RelaxationScheme, SymmetricGaussSeidel};
pub use setup::{DtMinPolicy, GridDims, Mode, Numerics, PhysicalInputs, ProblemSetup, Scheme};
pub use sink::{MemorySink, NullSink, OutputSink, Snapshot};
pub use solve::{IterationReport, SolveOutcome, SolveProgressEvent, Solver};
pub use state::{FlowState, FreshStart, InitialStateProvider, NEQ, P, U, V};
pub use verify::{ErrorNorms, discretization_error_norms};
