//! Errors raised by the core field and numeric helpers.

use thiserror::Error;

pub type CavResult<T> = Result<T, CavError>;

#[derive(Error, Debug)]
pub enum CavError {
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Node index out of range: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Stored data does not cover the grid it claims to describe.
    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}
