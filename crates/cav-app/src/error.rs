//! Error types for the cav-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors behind one
/// interface for the command line.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Case(String),

    #[error("Case validation failed: {0}")]
    Validation(String),

    #[error("Failed to write case file: {path}")]
    CaseFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cav-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for faults in the case itself rather than in the run.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            AppError::Case(_) | AppError::Validation(_) | AppError::InvalidInput(_)
        )
    }
}

impl From<cav_project::ProjectError> for AppError {
    fn from(err: cav_project::ProjectError) -> Self {
        match err {
            cav_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Case(other.to_string()),
        }
    }
}

impl From<cav_project::ValidationError> for AppError {
    fn from(err: cav_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<cav_solver::SolverError> for AppError {
    fn from(err: cav_solver::SolverError) -> Self {
        match err {
            cav_solver::SolverError::ProblemSetup { what } => AppError::InvalidInput(what),
            other => AppError::Solver(other.to_string()),
        }
    }
}

impl From<cav_results::ResultsError> for AppError {
    fn from(err: cav_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
