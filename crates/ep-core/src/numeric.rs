use crate::EpError;

/// Floating point type used throughout the lab.
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Tolerance band around a reference magnitude: `abs + rel * |scale|`.
    pub fn band(&self, scale: Real) -> Real {
        self.abs + self.rel * scale.abs()
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EpError::NonFinite { what, value: v })
    }
}

/// Reject negative or non-finite values.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, EpError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(EpError::InvalidArg { what });
    }
    Ok(v)
}
