//! Error types for blood-gas equilibrium.

use pf_core::error::PfError;
use pf_solver::SolverError;
use thiserror::Error;

/// Failures of a blood-gas evaluation.
///
/// These are recoverable: callers keep their previous snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BloodGasError {
    #[error("Acid-base solve failed: {0}")]
    AcidBase(#[source] SolverError),

    #[error("Oxygenation solve failed: {0}")]
    Oxygenation(#[source] SolverError),

    #[error("Invalid composition: {what}")]
    InvalidComposition { what: &'static str },
}

pub type BloodGasResult<T> = Result<T, BloodGasError>;

impl From<BloodGasError> for PfError {
    fn from(e: BloodGasError) -> Self {
        match e {
            BloodGasError::AcidBase(_) => PfError::InvalidArg {
                what: "acid-base solve failed",
            },
            BloodGasError::Oxygenation(_) => PfError::InvalidArg {
                what: "oxygenation solve failed",
            },
            BloodGasError::InvalidComposition { what } => PfError::InvalidArg { what },
        }
    }
}
