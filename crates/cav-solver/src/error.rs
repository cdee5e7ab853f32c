//! Error types for solver operations.

use cav_core::error::CavError;
use thiserror::Error;

/// Errors that can occur while setting up or driving the relaxation loop.
///
/// Numerical divergence is not an error: it ends the loop with
/// [`crate::Termination::Diverged`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Output sink error: {what}")]
    Output { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CavError),
}

pub type SolverResult<T> = Result<T, SolverError>;

