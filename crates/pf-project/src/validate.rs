//! Structural validation of model definitions.
//!
//! Only checks what can be decided without constructing components: names,
//! type tags and the clock. Attribute keys and references are checked by the
//! engine at build time.

use std::collections::HashSet;

use crate::schema::{ComponentDef, LATEST_VERSION, ModelDef};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate component name: {name}")]
    DuplicateName { name: String },

    #[error("Empty component name in {context}")]
    EmptyName { context: String },

    #[error("Component '{name}' has no model_type")]
    EmptyModelType { name: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_model(model: &ModelDef) -> Result<(), ValidationError> {
    if model.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: model.version,
        });
    }

    if !(model.time_step.is_finite() && model.time_step > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "time_step".to_string(),
            value: model.time_step.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for def in &model.components {
        validate_component(def, &model.name, &mut seen)?;
    }
    Ok(())
}

fn validate_component<'a>(
    def: &'a ComponentDef,
    context: &str,
    seen: &mut HashSet<&'a str>,
) -> Result<(), ValidationError> {
    if def.name.trim().is_empty() {
        return Err(ValidationError::EmptyName {
            context: context.to_string(),
        });
    }
    if !seen.insert(def.name.as_str()) {
        return Err(ValidationError::DuplicateName {
            name: def.name.clone(),
        });
    }
    if def.model_type.trim().is_empty() {
        return Err(ValidationError::EmptyModelType {
            name: def.name.clone(),
        });
    }
    for child in &def.components {
        validate_component(child, &def.name, seen)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(components: Vec<ComponentDef>) -> ModelDef {
        let mut m = ModelDef::new("m");
        m.components = components;
        m
    }

    #[test]
    fn accepts_well_formed_model() {
        let m = model(vec![
            ComponentDef::new("A", "Capacitance"),
            ComponentDef::new("B", "Capacitance"),
            ComponentDef::new("A_B", "Resistor"),
        ]);
        assert_eq!(validate_model(&m), Ok(()));
    }

    #[test]
    fn duplicate_names_across_tree() {
        let m = model(vec![
            ComponentDef::new("LV", "Capacitance"),
            ComponentDef::new("PC", "Container").with_child(ComponentDef::new("LV", "Capacitance")),
        ]);
        assert_eq!(
            validate_model(&m),
            Err(ValidationError::DuplicateName {
                name: "LV".to_string()
            })
        );
    }

    #[test]
    fn empty_name_and_type() {
        let m = model(vec![ComponentDef::new(" ", "Capacitance")]);
        assert!(matches!(
            validate_model(&m),
            Err(ValidationError::EmptyName { .. })
        ));

        let m = model(vec![ComponentDef::new("A", "")]);
        assert!(matches!(
            validate_model(&m),
            Err(ValidationError::EmptyModelType { .. })
        ));
    }

    #[test]
    fn bad_time_step() {
        let mut m = model(vec![]);
        m.time_step = 0.0;
        assert!(matches!(
            validate_model(&m),
            Err(ValidationError::InvalidValue { .. })
        ));
        m.time_step = f64::NAN;
        assert!(validate_model(&m).is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut m = model(vec![]);
        m.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_model(&m),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }
}
