//! Problem definition: physical inputs, numerical parameters and the
//! derived constants every kernel reads.

use crate::error::{SolverError, SolverResult};
use cav_core::{Real, ensure_finite};
use cav_core::units::{Density, Length, Pressure, Velocity};

/// Raw physical description of the cavity.
#[derive(Clone, Debug)]
pub struct PhysicalInputs {
    /// Fluid density
    pub rho: Density,
    /// Lid velocity
    pub uinf: Velocity,
    /// Reynolds number rho*uinf*L/mu
    pub re: Real,
    /// Reference pressure held at the cavity center (cavity mode)
    pub pinf: Pressure,
    pub xmin: Length,
    pub xmax: Length,
    pub ymin: Length,
    pub ymax: Length,
}

impl Default for PhysicalInputs {
    fn default() -> Self {
        use cav_core::units::{kgpm3, m, mps, pa};
        Self {
            rho: kgpm3(1.0),
            uinf: mps(1.0),
            re: 10.0,
            pinf: pa(0.801333844662),
            xmin: m(0.0),
            xmax: m(0.05),
            ymin: m(0.0),
            ymax: m(0.05),
        }
    }
}

/// Node counts in x and y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub nx: usize,
    pub ny: usize,
}

impl GridDims {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn validate(&self) -> SolverResult<()> {
        for (name, n) in [("nx", self.nx), ("ny", self.ny)] {
            if n < 5 {
                return Err(SolverError::ProblemSetup {
                    what: format!("{name} = {n} is too small (need at least 5 nodes)"),
                });
            }
            if n % 2 == 0 {
                return Err(SolverError::ProblemSetup {
                    what: format!("{name} = {n} must be odd"),
                });
            }
        }
        Ok(())
    }
}

/// Which value `dtmin` (the step used for pseudo-time accumulation) takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DtMinPolicy {
    /// Step of the last interior node visited by the estimator.
    #[default]
    LastNode,
    /// Smallest step over all interior nodes.
    GlobalMinimum,
}

/// Numerical parameters of the pseudo-time march.
#[derive(Clone, Debug)]
pub struct Numerics {
    /// CFL number applied to the local stable step
    pub cfl: Real,
    /// 4th-order dissipation coefficient in x
    pub cx: Real,
    /// 4th-order dissipation coefficient in y
    pub cy: Real,
    /// Preconditioning constant kappa (beta^2 floor is kappa * uinf^2)
    pub rkappa: Real,
    /// Convergence tolerance on the residual ratio
    pub toler: Real,
    /// Last iteration number the loop may execute
    pub max_iterations: usize,
    /// Iterations between residual history records
    pub residual_out: usize,
    /// Iterations between field/restart snapshots
    pub iterout: usize,
    pub dtmin_policy: DtMinPolicy,
    /// Run Point-Jacobi passes on the rayon pool
    pub parallel: bool,
}

impl Default for Numerics {
    fn default() -> Self {
        Self {
            cfl: 0.8,
            cx: 0.01,
            cy: 0.01,
            rkappa: 0.1,
            toler: 1e-10,
            max_iterations: 100_000,
            residual_out: 10,
            iterout: 500,
            dtmin_policy: DtMinPolicy::default(),
            parallel: false,
        }
    }
}

impl Numerics {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.cfl > 0.0 && self.cfl <= 1.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("cfl = {} must lie in (0, 1]", self.cfl),
            });
        }
        if !(self.cx >= 0.0 && self.cy >= 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "dissipation coefficients must be non-negative (cx = {}, cy = {})",
                    self.cx, self.cy
                ),
            });
        }
        if !(self.rkappa > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("rkappa = {} must be positive", self.rkappa),
            });
        }
        if !(self.toler > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("toler = {} must be positive", self.toler),
            });
        }
        if self.max_iterations == 0 || self.residual_out == 0 || self.iterout == 0 {
            return Err(SolverError::ProblemSetup {
                what: "max_iterations, residual_out and iterout must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Boundary/forcing mode of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Lid-driven cavity with no-slip walls.
    #[default]
    Cavity,
    /// Manufactured-solution verification.
    Manufactured,
}

/// Relaxation strategy, chosen once per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scheme {
    #[default]
    SymmetricGaussSeidel,
    PointJacobi,
}

/// Derived constants of a run. Immutable once built and shared by reference
/// with every kernel.
#[derive(Clone, Debug)]
pub struct ProblemSetup {
    pub nx: usize,
    pub ny: usize,
    pub rho: Real,
    pub rhoinv: Real,
    pub uinf: Real,
    pub re: Real,
    pub pinf: Real,
    /// Characteristic length (cavity width)
    pub rlength: Real,
    /// Dynamic viscosity rho*uinf*L/Re
    pub rmu: Real,
    /// Reference velocity squared
    pub vel2ref: Real,
    pub xmin: Real,
    pub xmax: Real,
    pub ymin: Real,
    pub ymax: Real,
    pub dx: Real,
    pub dy: Real,
}

impl ProblemSetup {
    /// Validate inputs and derive constants. Nothing is allocated on failure.
    pub fn new(inputs: &PhysicalInputs, grid: GridDims) -> SolverResult<Self> {
        grid.validate()?;

        let rho = inputs.rho.value;
        let uinf = inputs.uinf.value;
        let re = inputs.re;
        let (xmin, xmax) = (inputs.xmin.value, inputs.xmax.value);
        let (ymin, ymax) = (inputs.ymin.value, inputs.ymax.value);

        if !(xmax - xmin > 0.0) || !(ymax - ymin > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "domain extents must be positive (x: {xmin}..{xmax}, y: {ymin}..{ymax})"
                ),
            });
        }
        for (name, value) in [("rho", rho), ("uinf", uinf), ("re", re)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SolverError::ProblemSetup {
                    what: format!("{name} = {value} must be positive and finite"),
                });
            }
        }
        let pinf = ensure_finite(inputs.pinf.value, "pinf")?;

        let rlength = xmax - xmin;
        let rmu = rho * uinf * rlength / re;
        let setup = Self {
            nx: grid.nx,
            ny: grid.ny,
            rho,
            rhoinv: 1.0 / rho,
            uinf,
            re,
            pinf,
            rlength,
            rmu,
            vel2ref: uinf * uinf,
            xmin,
            xmax,
            ymin,
            ymax,
            dx: (xmax - xmin) / (grid.nx - 1) as Real,
            dy: (ymax - ymin) / (grid.ny - 1) as Real,
        };

        tracing::info!(
            rho = setup.rho,
            uinf = setup.uinf,
            length = setup.rlength,
            mu = setup.rmu,
            re = setup.re,
            nx = setup.nx,
            ny = setup.ny,
            "derived cavity constants"
        );
        Ok(setup)
    }

    pub fn dims(&self) -> GridDims {
        GridDims::new(self.nx, self.ny)
    }

    /// x coordinate of column `i`.
    #[inline]
    pub fn x(&self, i: usize) -> Real {
        self.xmin + (self.xmax - self.xmin) * i as Real / (self.nx - 1) as Real
    }

    /// y coordinate of row `j`.
    #[inline]
    pub fn y(&self, j: usize) -> Real {
        self.ymin + (self.ymax - self.ymin) * j as Real / (self.ny - 1) as Real
    }

    /// Index of the cavity center node.
    pub fn center(&self) -> (usize, usize) {
        ((self.nx - 1) / 2, (self.ny - 1) / 2)
    }

    /// Total node count nx*ny (the residual norm denominator).
    pub fn node_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Kinematic viscosity mu/rho.
    pub fn nu(&self) -> Real {
        self.rmu * self.rhoinv
    }
}
