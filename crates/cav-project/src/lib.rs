//! cav-project: case file format and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_case};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn finish(case: CaseConfig) -> ProjectResult<CaseConfig> {
    let case = migrate_to_latest(case)?;
    validate_case(&case)?;
    Ok(case)
}

/// Parse a YAML case from text.
pub fn parse_yaml(content: &str) -> ProjectResult<CaseConfig> {
    // an empty document deserializes as null, which means "all defaults"
    if content.trim().is_empty() {
        return finish(CaseConfig::default());
    }
    finish(serde_yaml::from_str(content)?)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<CaseConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn save_yaml(path: &std::path::Path, case: &CaseConfig) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<CaseConfig> {
    let content = std::fs::read_to_string(path)?;
    finish(serde_json::from_str(&content)?)
}

pub fn save_json(path: &std::path::Path, case: &CaseConfig) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_json::to_string_pretty(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a case, choosing the format from the file extension (`.json` or YAML).
pub fn load_case(path: &std::path::Path) -> ProjectResult<CaseConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
