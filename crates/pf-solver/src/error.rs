//! Error types for root finding.

use pf_core::error::PfError;
use thiserror::Error;

/// Errors that can occur while searching for a root.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Root not bracketed: f(left) = {f_left}, f(right) = {f_right}")]
    NotBracketed { f_left: f64, f_right: f64 },

    #[error("Maximum iterations {iterations} reached (best x = {best}, |f| = {residual})")]
    MaxIterations {
        iterations: usize,
        best: f64,
        residual: f64,
    },

    #[error("Invalid bracket: left = {left}, right = {right}")]
    InvalidBracket { left: f64, right: f64 },

    #[error("Non-finite value: {what}")]
    NonFinite { what: &'static str },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for PfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::NotBracketed { .. } => PfError::InvalidArg {
                what: "root not bracketed",
            },
            SolverError::MaxIterations { .. } => PfError::InvalidArg {
                what: "root finder did not converge",
            },
            SolverError::InvalidBracket { .. } => PfError::InvalidArg {
                what: "invalid bracket",
            },
            SolverError::NonFinite { what } => PfError::InvalidArg { what },
        }
    }
}
