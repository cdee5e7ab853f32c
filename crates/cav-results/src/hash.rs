//! Content-based hashing for run IDs.

use cav_project::CaseConfig;
use sha2::{Digest, Sha256};

/// Hex SHA-256 over the case (without its restart path) and the solver version.
pub fn compute_run_id(case: &CaseConfig, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let mut keyed = case.clone();
    keyed.restart = None;
    let case_json = serde_json::to_string(&keyed).unwrap_or_default();
    hasher.update(case_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
