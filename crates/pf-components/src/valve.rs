//! One-way valve.

use pf_core::AttrValue;

use crate::common::{number, unknown};
use crate::context::TickContext;
use crate::error::ComponentResult;
use crate::resistor::{BackFlow, Connector};
use crate::traits::{Component, ComponentMeta, RegistryHandle, StepOutcome};

/// Strictly forward connector.
///
/// A reversed gradient closes the valve completely; there is no backward
/// conductance. The quadratic term uses the flow of the last open tick, which
/// is forgotten when the valve closes.
#[derive(Clone, Debug)]
pub struct Valve {
    meta: ComponentMeta,
    pub connector: Connector,
    prev_flow: f64,
}

impl Valve {
    pub const MODEL_TYPE: &'static str = "Valve";

    const KEYS: [&'static str; 11] = [
        "comp_from",
        "comp_to",
        "r_for",
        "r_k",
        "no_flow",
        "p1_ext",
        "p2_ext",
        "r_for_factor",
        "r_for_factor_ps",
        "r_k_factor",
        "r_k_factor_ps",
    ];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(name),
            connector: Connector::default(),
            prev_flow: 0.0,
        }
    }

    pub fn between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connector.comp_from = from.into();
        self.connector.comp_to = to.into();
        self
    }

    pub fn with_resistance(mut self, r_for: f64) -> Self {
        self.connector.r_for = r_for;
        self
    }

    pub fn flow(&self) -> f64 {
        self.connector.flow
    }

    pub fn is_open(&self) -> bool {
        self.connector.flow > 0.0
    }
}

impl Component for Valve {
    fn meta(&self) -> &ComponentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ComponentMeta {
        &mut self.meta
    }

    fn model_type(&self) -> &'static str {
        Self::MODEL_TYPE
    }

    fn set_attribute(&mut self, key: &str, value: &AttrValue) -> ComponentResult<()> {
        if key == "prev_flow" {
            self.prev_flow = number(key, value)?;
            return Ok(());
        }
        if Self::KEYS.contains(&key) && self.connector.set(key, value)? {
            Ok(())
        } else {
            Err(unknown(&self.meta.name, key))
        }
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "prev_flow" => Some(AttrValue::Number(self.prev_flow)),
            "open" => Some(AttrValue::Bool(self.is_open())),
            "r_back" | "r_back_factor" | "r_back_factor_ps" | "no_back_flow" => None,
            _ => self.connector.get(key),
        }
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        let mut keys = Self::KEYS.to_vec();
        keys.push("prev_flow");
        keys
    }

    fn resolve(&mut self, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        self.connector.resolve(&self.meta.name, registry)
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        let flow = self
            .connector
            .compute_flow(&self.meta.name, ctx, self.prev_flow, BackFlow::Blocked)?;
        self.prev_flow = flow;
        self.connector.transfer(ctx)?;
        Ok(StepOutcome::Done)
    }
}
