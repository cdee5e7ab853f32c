//! Case compilation: turn a validated [`CaseConfig`] into solver inputs.

use cav_core::units::{kgpm3, m, mps, pa};
use cav_project::{CaseConfig, DtMinDef, ModeDef, SchemeDef, validate_case};
use cav_solver::{DtMinPolicy, GridDims, Mode, Numerics, PhysicalInputs, ProblemSetup, Scheme};

use crate::error::AppResult;

/// Everything the solver needs, derived from one case.
#[derive(Debug, Clone)]
pub struct CompiledCase {
    pub setup: ProblemSetup,
    pub numerics: Numerics,
    pub mode: Mode,
    pub scheme: Scheme,
}

pub fn physical_inputs(case: &CaseConfig) -> PhysicalInputs {
    let ph = &case.physics;
    PhysicalInputs {
        rho: kgpm3(ph.rho_kg_m3),
        uinf: mps(ph.uinf_m_s),
        re: ph.re,
        pinf: pa(ph.pinf_pa),
        xmin: m(ph.xmin_m),
        xmax: m(ph.xmax_m),
        ymin: m(ph.ymin_m),
        ymax: m(ph.ymax_m),
    }
}

pub fn numerics(case: &CaseConfig) -> Numerics {
    let nm = &case.numerics;
    Numerics {
        cfl: nm.cfl,
        cx: nm.cx,
        cy: nm.cy,
        rkappa: nm.rkappa,
        toler: nm.toler,
        max_iterations: nm.max_iterations,
        residual_out: case.output.residual_out,
        iterout: case.output.iterout,
        dtmin_policy: match nm.dtmin {
            DtMinDef::LastNode => DtMinPolicy::LastNode,
            DtMinDef::GlobalMinimum => DtMinPolicy::GlobalMinimum,
        },
        parallel: nm.parallel,
    }
}

pub fn mode(case: &CaseConfig) -> Mode {
    match case.mode {
        ModeDef::Cavity => Mode::Cavity,
        ModeDef::Manufactured => Mode::Manufactured,
    }
}

pub fn scheme(case: &CaseConfig) -> Scheme {
    match case.numerics.scheme {
        SchemeDef::Sgs => Scheme::SymmetricGaussSeidel,
        SchemeDef::PointJacobi => Scheme::PointJacobi,
    }
}

/// Validate `case` and derive the problem setup and numerics.
pub fn compile_case(case: &CaseConfig) -> AppResult<CompiledCase> {
    validate_case(case)?;

    let setup = ProblemSetup::new(
        &physical_inputs(case),
        GridDims::new(case.grid.nx, case.grid.ny),
    )?;
    let numerics = numerics(case);
    numerics.validate()?;

    Ok(CompiledCase {
        setup,
        numerics,
        mode: mode(case),
        scheme: scheme(case),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_case_compiles_to_reference_setup() {
        let compiled = compile_case(&CaseConfig::default()).unwrap();
        assert_eq!((compiled.setup.nx, compiled.setup.ny), (65, 65));
        assert_eq!(compiled.mode, Mode::Cavity);
        assert_eq!(compiled.scheme, Scheme::SymmetricGaussSeidel);
        assert_eq!(compiled.numerics.iterout, 500);
        assert_eq!(compiled.numerics.dtmin_policy, DtMinPolicy::LastNode);
        // rmu = rho * uinf * L / Re with L = 0.05
        assert!((compiled.setup.rmu - 0.005).abs() < 1e-15);
    }

    #[test]
    fn enum_choices_map_through() {
        let mut case = CaseConfig::default();
        case.mode = ModeDef::Manufactured;
        case.numerics.scheme = SchemeDef::PointJacobi;
        case.numerics.dtmin = DtMinDef::GlobalMinimum;
        case.numerics.parallel = true;
        let compiled = compile_case(&case).unwrap();
        assert_eq!(compiled.mode, Mode::Manufactured);
        assert_eq!(compiled.scheme, Scheme::PointJacobi);
        assert_eq!(compiled.numerics.dtmin_policy, DtMinPolicy::GlobalMinimum);
        assert!(compiled.numerics.parallel);
    }

    #[test]
    fn even_grid_is_a_validation_error() {
        let mut case = CaseConfig::default();
        case.grid.nx = 64;
        let err = compile_case(&case).unwrap_err();
        assert!(matches!(err, crate::AppError::Validation(_)));
        assert!(err.is_configuration_fault());
    }
}
