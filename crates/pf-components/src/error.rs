//! Error types for component operations.

use pf_core::error::PfError;
use pf_core::ids::CompId;
use thiserror::Error;

/// Errors raised while configuring or stepping a component.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Unknown attribute '{key}' on {component}")]
    UnknownAttribute { component: String, key: String },

    #[error("Attribute '{key}': {source}")]
    AttrType {
        key: String,
        #[source]
        source: PfError,
    },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: &'static str },

    #[error("{component} references unknown component '{target}'")]
    UnresolvedReference { component: String, target: String },

    #[error("{component} requires '{target}' to be a capacitive compartment")]
    NotCapacitive { component: String, target: String },

    #[error("Component slot {target} is not available")]
    Unavailable { target: CompId },

    #[error("Negative volume {volume} in {component}")]
    NegativeVolume { component: String, volume: f64 },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    pub(crate) fn attr(key: &str, source: PfError) -> Self {
        ComponentError::AttrType {
            key: key.to_string(),
            source,
        }
    }

    /// True for errors that describe a bad build spec rather than a run-time
    /// failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ComponentError::UnknownAttribute { .. }
                | ComponentError::AttrType { .. }
                | ComponentError::InvalidValue { .. }
                | ComponentError::UnresolvedReference { .. }
                | ComponentError::NotCapacitive { .. }
        )
    }
}

impl From<ComponentError> for PfError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NegativeVolume { .. } => PfError::Invariant {
                what: "negative volume",
            },
            ComponentError::NonPhysical { what } => PfError::InvalidArg { what },
            ComponentError::AttrType { source, .. } => source,
            _ => PfError::InvalidArg {
                what: "component configuration",
            },
        }
    }
}
