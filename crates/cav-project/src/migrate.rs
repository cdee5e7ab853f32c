//! Case file migration.

use crate::ProjectError;
use crate::schema::CaseConfig;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut case: CaseConfig) -> Result<CaseConfig, ProjectError> {
    while case.version < LATEST_VERSION {
        case = migrate_one_version(case)?;
    }
    Ok(case)
}

fn migrate_one_version(case: CaseConfig) -> Result<CaseConfig, ProjectError> {
    match case.version {
        0 => migrate_v0_to_v1(case),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 differs from version 1 only in its version number.
fn migrate_v0_to_v1(mut case: CaseConfig) -> Result<CaseConfig, ProjectError> {
    case.version = 1;
    Ok(case)
}
