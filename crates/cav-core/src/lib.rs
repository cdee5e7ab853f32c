//! cav-core: shared foundation for the cavity solver.
//!
//! Contains:
//! - units (uom SI types + constructors for the physical inputs)
//! - numeric (Real + tolerances + float helpers)
//! - field (dense structured-grid storage)
//! - error (shared error types)
//! - timing (opt-in wall clock instrumentation)

pub mod error;
pub mod field;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{CavError, CavResult};
pub use field::{Field, Shape};
pub use numeric::*;
pub use units::*;
