use crate::CavError;

/// Floating point type of every field and constant
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CavError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CavError::NonFinite { what, value: v })
    }
}

#[inline]
pub fn pow2(x: Real) -> Real {
    x * x
}

/// Root-mean-square from an accumulated sum of squares over `count` samples.
#[inline]
pub fn rms(sum_sq: Real, count: usize) -> Real {
    (sum_sq / count as Real).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn rms_of_constant_samples() {
        // four samples of 2.0 -> sum of squares 16
        assert_eq!(rms(16.0, 4), 2.0);
    }
}
