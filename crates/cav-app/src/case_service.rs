//! Case loading, writing and introspection.

use std::path::Path;

use cav_project::CaseConfig;

use crate::case_compile;
use crate::error::{AppError, AppResult};

/// Short description of a case for listing.
#[derive(Debug, Clone)]
pub struct CaseSummary {
    pub name: String,
    pub mode: String,
    pub scheme: String,
    pub nx: usize,
    pub ny: usize,
    pub re: f64,
    /// Stable pseudo-time step bound of the viscous limit, dx*dy/(4 nu)
    pub viscous_dt_bound_s: f64,
    pub restart: Option<String>,
}

/// Load a case (YAML, or JSON by extension), migrated and validated.
pub fn load_case(path: &Path) -> AppResult<CaseConfig> {
    Ok(cav_project::load_case(path)?)
}

/// Load a case and check that it compiles into a solver setup.
pub fn validate_case_file(path: &Path) -> AppResult<CaseSummary> {
    let case = load_case(path)?;
    summarize(&case)
}

pub fn summarize(case: &CaseConfig) -> AppResult<CaseSummary> {
    let compiled = case_compile::compile_case(case)?;
    let setup = &compiled.setup;
    Ok(CaseSummary {
        name: case.name.clone(),
        mode: format!("{:?}", compiled.mode),
        scheme: format!("{:?}", compiled.scheme),
        nx: setup.nx,
        ny: setup.ny,
        re: setup.re,
        viscous_dt_bound_s: setup.dx * setup.dy / (4.0 * setup.nu()),
        restart: case.restart.as_ref().map(|p| p.display().to_string()),
    })
}

/// The reference case as YAML text.
pub fn default_case_yaml() -> AppResult<String> {
    serde_yaml::to_string(&CaseConfig::default())
        .map_err(|e| AppError::Case(format!("Failed to serialize default case: {}", e)))
}

/// Write the reference case to `path`, refusing to replace an existing file.
pub fn write_default_case(path: &Path) -> AppResult<()> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    let content = default_case_yaml()?;
    std::fs::write(path, content).map_err(|e| AppError::CaseFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
