#![allow(dead_code)]

use std::collections::HashMap;

use pf_components::{
    Capacitive, Component, ComponentResult, ComponentSlots, RegistryHandle, StepOutcome,
    TickContext, VolumeGuard, init, read_attribute, step,
};
use pf_core::{AttrValue, CompId};

pub const DT: f64 = 0.0005;

/// Minimal registry: build order is insertion order.
#[derive(Default)]
pub struct Bench {
    slots: ComponentSlots,
    names: HashMap<String, CompId>,
    pub time: f64,
    pub guard: VolumeGuard,
}

impl RegistryHandle for Bench {
    fn lookup(&self, name: &str) -> Option<CompId> {
        self.names.get(name).copied()
    }

    fn component(&self, id: CompId) -> Option<&dyn Component> {
        self.slots.get(id)
    }
}

impl Bench {
    pub fn add(&mut self, component: impl Component + 'static) -> CompId {
        let name = component.name().to_string();
        let id = self.slots.push(Box::new(component)).unwrap();
        self.names.insert(name, id);
        id
    }

    pub fn init(&mut self, name: &str, args: &[(&str, AttrValue)]) -> ComponentResult<()> {
        let id = self.names[name];
        let mut c = self.slots.take(id).unwrap();
        let result = init(c.as_mut(), args.iter().map(|(k, v)| (*k, v)), &*self);
        self.slots.restore(id, c);
        result
    }

    pub fn init_all(&mut self) -> ComponentResult<()> {
        let mut names: Vec<(CompId, String)> =
            self.names.iter().map(|(n, id)| (*id, n.clone())).collect();
        names.sort();
        for (_, name) in names {
            self.init(&name, &[])?;
        }
        Ok(())
    }

    pub fn tick(&mut self) -> ComponentResult<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(self.slots.len());
        for i in 0..self.slots.len() {
            let id = CompId::from_usize(i).unwrap();
            let mut c = self.slots.take(id).unwrap();
            let result = {
                let mut ctx = TickContext::new(DT, self.time, self.guard, &mut self.slots);
                step(c.as_mut(), &mut ctx)
            };
            self.slots.restore(id, c);
            outcomes.push(result?);
        }
        self.time += DT;
        Ok(outcomes)
    }

    pub fn cap(&self, name: &str) -> &dyn Capacitive {
        self.slots
            .get(self.names[name])
            .and_then(|c| c.as_capacitive())
            .unwrap()
    }

    pub fn number(&self, name: &str, key: &str) -> f64 {
        let c = self.slots.get(self.names[name]).unwrap();
        read_attribute(c, key).unwrap().as_f64().unwrap()
    }

    pub fn attr(&self, name: &str, key: &str) -> Option<AttrValue> {
        let c = self.slots.get(self.names[name]).unwrap();
        read_attribute(c, key)
    }

    pub fn set(&mut self, name: &str, key: &str, value: impl Into<AttrValue>) {
        let id = self.names[name];
        let c = self.slots.get_mut(id).unwrap();
        c.set_attribute(key, &value.into()).unwrap();
    }
}
