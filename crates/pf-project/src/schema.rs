//! Model definition schema.

use std::collections::BTreeMap;

use pf_core::AttrValue;
use serde::{Deserialize, Serialize};

/// Current schema version written by `save_*`.
pub const LATEST_VERSION: u32 = 1;

/// Default fixed time step (s).
pub const DEFAULT_TIME_STEP: f64 = 0.0005;

fn default_time_step() -> f64 {
    DEFAULT_TIME_STEP
}

fn default_enabled() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

/// A complete model: clock settings plus the ordered component list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    #[serde(default)]
    pub version: u32,
    pub name: String,
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            time_step: DEFAULT_TIME_STEP,
            description: String::new(),
            components: Vec::new(),
        }
    }

    /// Depth-first walk over every definition, parents before children.
    pub fn walk(&self) -> Vec<&ComponentDef> {
        let mut out = Vec::new();
        for def in &self.components {
            def.collect_into(&mut out);
        }
        out
    }
}

/// One component entry.
///
/// Every key other than the fixed ones is an attribute passed verbatim to the
/// component's `init`. Children listed under `components` are built after
/// their parent and added to its `contained_components`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub model_type: String,
    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDef>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_type: model_type.into(),
            is_enabled: true,
            components: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ComponentDef) -> Self {
        self.components.push(child);
        self
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a ComponentDef>) {
        out.push(self);
        for child in &self.components {
            child.collect_into(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_flattened() {
        let yaml = r#"
name: test
components:
  - name: LV
    model_type: TimeVaryingElastance
    vol: 0.12
    el_max: 2500
    fixed_composition: false
  - name: Heart
    model_type: Heart
    is_enabled: false
    ventricular_chambers: [LV]
"#;
        let model: ModelDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(model.time_step, DEFAULT_TIME_STEP);
        assert_eq!(model.components.len(), 2);

        let lv = &model.components[0];
        assert!(lv.is_enabled);
        assert_eq!(lv.attributes["vol"], AttrValue::Number(0.12));
        assert_eq!(lv.attributes["el_max"], AttrValue::Number(2500.0));
        assert_eq!(lv.attributes["fixed_composition"], AttrValue::Bool(false));

        let heart = &model.components[1];
        assert!(!heart.is_enabled);
        assert_eq!(
            heart.attributes["ventricular_chambers"],
            AttrValue::Names(vec!["LV".to_string()])
        );
    }

    #[test]
    fn maps_and_children() {
        let json = r#"{
            "name": "test",
            "components": [
                {
                    "name": "PC",
                    "model_type": "Container",
                    "vol_extra": 0.02,
                    "components": [
                        { "name": "LV", "model_type": "BloodCapacitance", "solutes": { "na": 140.0 } }
                    ]
                }
            ]
        }"#;
        let model: ModelDef = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = model.walk().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["PC", "LV"]);

        let lv = &model.components[0].components[0];
        let solutes = lv.attributes["solutes"].as_map().unwrap();
        assert_eq!(solutes["na"], 140.0);
    }

    #[test]
    fn enabled_flag_is_omitted_when_default() {
        let def = ComponentDef::new("A", "Capacitance").with("vol", 1.0);
        let yaml = serde_yaml::to_string(&def).unwrap();
        assert!(!yaml.contains("is_enabled"));
        assert!(yaml.contains("vol: 1.0"));
    }
}
