//! Case validation.

use crate::schema::CaseConfig;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

pub fn validate_case(case: &CaseConfig) -> Result<(), ValidationError> {
    if case.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    for (field, n) in [("grid.nx", case.grid.nx), ("grid.ny", case.grid.ny)] {
        if n < 5 {
            return Err(invalid(field, n, "need at least 5 nodes"));
        }
        if n % 2 == 0 {
            return Err(invalid(field, n, "must be odd"));
        }
    }

    let ph = &case.physics;
    require_positive("physics.rho_kg_m3", ph.rho_kg_m3)?;
    require_positive("physics.uinf_m_s", ph.uinf_m_s)?;
    require_positive("physics.re", ph.re)?;
    if !ph.pinf_pa.is_finite() {
        return Err(invalid("physics.pinf_pa", ph.pinf_pa, "must be finite"));
    }
    require_positive("physics.xmax_m - xmin_m", ph.xmax_m - ph.xmin_m)?;
    require_positive("physics.ymax_m - ymin_m", ph.ymax_m - ph.ymin_m)?;

    let nm = &case.numerics;
    if !(nm.cfl > 0.0 && nm.cfl <= 1.0) {
        return Err(invalid("numerics.cfl", nm.cfl, "must lie in (0, 1]"));
    }
    if !(nm.cx >= 0.0) {
        return Err(invalid("numerics.cx", nm.cx, "must be non-negative"));
    }
    if !(nm.cy >= 0.0) {
        return Err(invalid("numerics.cy", nm.cy, "must be non-negative"));
    }
    require_positive("numerics.rkappa", nm.rkappa)?;
    require_positive("numerics.toler", nm.toler)?;
    if nm.max_iterations == 0 {
        return Err(invalid("numerics.max_iterations", 0, "must be positive"));
    }

    if case.output.iterout == 0 {
        return Err(invalid("output.iterout", 0, "must be positive"));
    }
    if case.output.residual_out == 0 {
        return Err(invalid("output.residual_out", 0, "must be positive"));
    }

    Ok(())
}
