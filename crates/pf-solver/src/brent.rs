//! Brent's method for a bracketed scalar root.
//!
//! Each iteration proposes a step by inverse quadratic interpolation when the
//! last three function values are distinct and by the secant rule otherwise.
//! The proposal is replaced by a bisection step when it would land outside
//! `[(3a + b) / 4, b]`, when it fails to shrink the step compared with the
//! previous two iterations, or when those steps were already below the
//! resolution limit. The bracket `[a, b]` always keeps a sign change.

use tracing::debug;

use crate::error::{SolverError, SolverResult};

/// Brent solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct BrentConfig {
    /// Maximum iterations; exhausting them is a failure.
    pub max_iterations: usize,
    /// Convergence threshold on `|f(x)|`.
    pub f_tol: f64,
    /// Absolute resolution on `x` used by the progress heuristic.
    /// A relative machine-epsilon term is always added.
    pub x_tol: f64,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            f_tol: 1e-8,
            x_tol: 0.0,
        }
    }
}

impl BrentConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_f_tol(mut self, f_tol: f64) -> Self {
        self.f_tol = f_tol;
        self
    }
}

/// Brent iteration result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrentSolution {
    /// Root estimate
    pub x: f64,
    /// Objective value at `x`
    pub fx: f64,
    /// Number of objective evaluations after the two bracket endpoints
    pub iterations: usize,
}

/// Find a root of `f` inside `[left, right]`.
///
/// Fails immediately with [`SolverError::NotBracketed`] if `f(left)` and
/// `f(right)` share a sign. An endpoint that is an exact root is returned
/// without iterating.
pub fn brent<F>(mut f: F, left: f64, right: f64, config: &BrentConfig) -> SolverResult<BrentSolution>
where
    F: FnMut(f64) -> f64,
{
    if !left.is_finite() || !right.is_finite() || left == right {
        return Err(SolverError::InvalidBracket { left, right });
    }

    let mut a = left;
    let mut b = right;
    let mut fa = finite(f(a), "f(left)")?;
    let mut fb = finite(f(b), "f(right)")?;

    if fa == 0.0 {
        return Ok(BrentSolution {
            x: a,
            fx: fa,
            iterations: 0,
        });
    }
    if fb == 0.0 {
        return Ok(BrentSolution {
            x: b,
            fx: fb,
            iterations: 0,
        });
    }
    if fa.signum() == fb.signum() {
        return Err(SolverError::NotBracketed {
            f_left: fa,
            f_right: fb,
        });
    }

    // b is always the best estimate so far
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = c;
    let mut bisected = true;

    for iteration in 0..config.max_iterations {
        if fb.abs() < config.f_tol {
            return Ok(BrentSolution {
                x: b,
                fx: fb,
                iterations: iteration,
            });
        }

        let mut s = if fa != fc && fb != fc {
            // inverse quadratic interpolation
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            // secant
            b - fb * (b - a) / (fb - fa)
        };

        let delta = 2.0 * f64::EPSILON * b.abs() + config.x_tol;
        let quarter = (3.0 * a + b) / 4.0;
        let outside = !(s > quarter.min(b) && s < quarter.max(b));
        let stalled = if bisected {
            (s - b).abs() >= (b - c).abs() / 2.0 || (b - c).abs() < delta
        } else {
            (s - b).abs() >= (c - d).abs() / 2.0 || (c - d).abs() < delta
        };

        if outside || stalled || !s.is_finite() {
            s = 0.5 * (a + b);
            bisected = true;
        } else {
            bisected = false;
        }

        let fs = finite(f(s), "f(x)")?;
        d = c;
        c = b;
        fc = fb;

        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }

        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
    }

    if fb.abs() < config.f_tol {
        return Ok(BrentSolution {
            x: b,
            fx: fb,
            iterations: config.max_iterations,
        });
    }

    debug!(
        iterations = config.max_iterations,
        best = b,
        residual = fb.abs(),
        "brent iteration budget exhausted"
    );
    Err(SolverError::MaxIterations {
        iterations: config.max_iterations,
        best: b,
        residual: fb.abs(),
    })
}

/// Convenience form: `solve(f, left, right, max_iter, tol)`.
pub fn solve<F>(f: F, left: f64, right: f64, max_iter: usize, tol: f64) -> SolverResult<f64>
where
    F: FnMut(f64) -> f64,
{
    let config = BrentConfig {
        max_iterations: max_iter,
        f_tol: tol,
        x_tol: 0.0,
    };
    brent(f, left, right, &config).map(|sol| sol.x)
}

fn finite(v: f64, what: &'static str) -> SolverResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SolverError::NonFinite { what })
    }
}
