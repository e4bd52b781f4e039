//! Error types for engine operations.

use pf_bloodgas::BloodGasError;
use pf_components::ComponentError;
use pf_project::{ProjectError, ValidationError};
use thiserror::Error;

/// Errors raised while building or running a model.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad model definition. Fatal at build time.
    #[error("Configuration error in '{component}': {reason}")]
    Configuration { component: String, reason: String },

    /// A run-time physical invariant broke. Fatal for the run.
    #[error("Invariant violated in '{component}': {what}")]
    InvariantViolation { component: String, what: String },

    #[error("Component '{component}' failed: {source}")]
    Runtime {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("Unknown property: {path}")]
    UnknownProperty { path: String },

    #[error("Malformed property path '{path}': expected Component.attribute[.key]")]
    InvalidPath { path: String },

    #[error("Blood-gas update failed in '{component}': {source}")]
    BloodGas {
        component: String,
        #[source]
        source: BloodGasError,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Project(#[from] ProjectError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn configuration(component: &str, reason: impl ToString) -> Self {
        EngineError::Configuration {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify a failure raised while stepping `component`.
    pub(crate) fn from_step(component: &str, error: ComponentError) -> Self {
        match error {
            ComponentError::NegativeVolume { component, volume } => {
                EngineError::InvariantViolation {
                    component,
                    what: format!("volume fell to {volume} L"),
                }
            }
            e if e.is_configuration() => EngineError::configuration(component, e),
            source => EngineError::Runtime {
                component: component.to_string(),
                source,
            },
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::DuplicateName { name } => {
                EngineError::configuration(&name, "duplicate name")
            }
            other => EngineError::Project(ProjectError::Validation(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_volume_is_an_invariant_violation() {
        let e = EngineError::from_step(
            "LV",
            ComponentError::NegativeVolume {
                component: "LV".to_string(),
                volume: -0.01,
            },
        );
        assert!(matches!(e, EngineError::InvariantViolation { ref component, .. } if component == "LV"));
    }

    #[test]
    fn unresolved_reference_is_configuration() {
        let e = EngineError::from_step(
            "R",
            ComponentError::UnresolvedReference {
                component: "R".to_string(),
                target: "X".to_string(),
            },
        );
        assert!(matches!(e, EngineError::Configuration { .. }));
        assert!(e.to_string().contains("'R'"));
    }

    #[test]
    fn duplicate_name_is_configuration() {
        let e: EngineError = ValidationError::DuplicateName {
            name: "LA".to_string(),
        }
        .into();
        assert!(matches!(e, EngineError::Configuration { ref component, .. } if component == "LA"));

        let e: EngineError = ValidationError::EmptyModelType {
            name: "LA".to_string(),
        }
        .into();
        assert!(matches!(e, EngineError::Project(ProjectError::Validation(_))));
    }
}
