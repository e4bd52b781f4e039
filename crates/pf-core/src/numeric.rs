use crate::PfError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PfError::NonFinite { what, value: v })
    }
}

/// Compose a base value with a non-persistent and a persistent modifier.
///
/// Each factor contributes an additive delta scaled by the base:
/// `base * (1 + (f - 1) + (f_ps - 1))`. Independent channels therefore add
/// linearly instead of multiplying.
#[inline]
pub fn compose_factors(base: Real, factors: &[Real]) -> Real {
    let delta: Real = factors.iter().map(|f| f - 1.0).sum();
    base * (1.0 + delta)
}
