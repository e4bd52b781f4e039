//! Modifier channels on a base parameter.

use pf_core::numeric::compose_factors;

/// A non-persistent and a persistent multiplier on one base value.
///
/// `np` is a this-tick perturbation and returns to 1.0 after every `calc`;
/// `ps` stays until changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Factor {
    pub np: f64,
    pub ps: f64,
}

impl Default for Factor {
    fn default() -> Self {
        Self { np: 1.0, ps: 1.0 }
    }
}

impl Factor {
    #[inline]
    pub fn apply(&self, base: f64) -> f64 {
        compose_factors(base, &[self.np, self.ps])
    }

    #[inline]
    pub fn reset(&mut self) {
        self.np = 1.0;
    }
}
