//! Application service layer for the cavity solver.
//!
//! Centralizes case handling, run execution and result lookup so the command
//! line front end stays a thin shell.

pub mod case_compile;
pub mod case_service;
pub mod error;
pub mod progress;
pub mod run_service;

pub use case_compile::{CompiledCase, compile_case};
pub use case_service::{CaseSummary, load_case, validate_case_file, write_default_case};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use run_service::{
    RunOptions, RunSummary, RunTimingSummary, list_runs, load_run, run_case,
    run_case_with_options,
};

pub use cav_solver::Termination;
