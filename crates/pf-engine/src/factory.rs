//! Type tag to constructor registry.

use std::collections::BTreeMap;

use pf_components::{
    BloodCapacitance, BloodTimeVaryingElastance, Capacitance, Component, Container, Heart,
    Resistor, TimeVaryingElastance, Valve,
};

/// Builds an unconfigured component with the given name.
pub type Constructor = fn(&str) -> Box<dyn Component>;

/// Explicit registry of the component types a model definition may name.
#[derive(Clone, Debug)]
pub struct ModelFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl Default for ModelFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(Capacitance::MODEL_TYPE, |n| Box::new(Capacitance::new(n)));
        factory.register(BloodCapacitance::MODEL_TYPE, |n| {
            Box::new(BloodCapacitance::new(n))
        });
        factory.register(TimeVaryingElastance::MODEL_TYPE, |n| {
            Box::new(TimeVaryingElastance::new(n))
        });
        factory.register(BloodTimeVaryingElastance::MODEL_TYPE, |n| {
            Box::new(BloodTimeVaryingElastance::new(n))
        });
        factory.register(Resistor::MODEL_TYPE, |n| Box::new(Resistor::new(n)));
        factory.register(Valve::MODEL_TYPE, |n| Box::new(Valve::new(n)));
        factory.register(Heart::MODEL_TYPE, |n| Box::new(Heart::new(n)));
        factory.register(Container::MODEL_TYPE, |n| Box::new(Container::new(n)));
        factory
    }
}

impl ModelFactory {
    /// Factory with no types registered.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) a type tag.
    pub fn register(&mut self, model_type: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(model_type.into(), constructor);
    }

    pub fn create(&self, model_type: &str, name: &str) -> Option<Box<dyn Component>> {
        self.constructors.get(model_type).map(|ctor| ctor(name))
    }

    pub fn contains(&self, model_type: &str) -> bool {
        self.constructors.contains_key(model_type)
    }

    pub fn model_types(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
