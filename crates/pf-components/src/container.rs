//! Composite compartment enclosing other compartments.

use pf_bloodgas::BloodContent;
use pf_core::{AttrValue, CompId};

use crate::capacitance::Capacitance;
use crate::common::{names, number, resolve_capacitive, unknown};
use crate::context::TickContext;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{Capacitive, Component, ComponentMeta, RegistryHandle, StepOutcome};

/// Pericardium- or thorax-like enclosure.
///
/// Its volume is the sum of the enclosed compartments plus `vol_extra`; its
/// pressure follows the [`Capacitance`] law and is added to the external
/// pressure of every enclosed compartment each tick. It must tick before its
/// children to affect them in the same tick.
#[derive(Clone, Debug)]
pub struct Container {
    pub body: Capacitance,
    /// Volume not held by any enclosed compartment (L)
    pub vol_extra: f64,
    pub contained_components: Vec<String>,
    ids: Vec<CompId>,
}

impl Container {
    pub const MODEL_TYPE: &'static str = "Container";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            body: Capacitance::new(name),
            vol_extra: 0.0,
            contained_components: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub fn containing<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contained_components = children.into_iter().map(Into::into).collect();
        self
    }
}

impl Component for Container {
    fn meta(&self) -> &ComponentMeta {
        self.body.meta()
    }

    fn meta_mut(&mut self) -> &mut ComponentMeta {
        self.body.meta_mut()
    }

    fn model_type(&self) -> &'static str {
        Self::MODEL_TYPE
    }

    fn set_attribute(&mut self, key: &str, value: &AttrValue) -> ComponentResult<()> {
        match key {
            "vol" => Err(ComponentError::InvalidValue {
                key: key.to_string(),
                reason: "container volume is derived; set vol_extra",
            }),
            "vol_extra" => {
                self.vol_extra = number(key, value)?;
                Ok(())
            }
            "contained_components" => {
                self.contained_components = names(key, value)?;
                self.ids.clear();
                Ok(())
            }
            _ => {
                if self.body.set(key, value)? {
                    Ok(())
                } else {
                    Err(unknown(self.name(), key))
                }
            }
        }
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "vol_extra" => Some(AttrValue::Number(self.vol_extra)),
            "contained_components" => Some(AttrValue::Names(self.contained_components.clone())),
            _ => self.body.get(key),
        }
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Capacitance::keys()
            .into_iter()
            .filter(|k| *k != "vol")
            .collect();
        keys.push("vol_extra");
        keys.push("contained_components");
        keys
    }

    fn resolve(&mut self, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        let owner = self.body.name().to_string();
        self.ids = self
            .contained_components
            .iter()
            .map(|n| resolve_capacitive(&owner, n, registry))
            .collect::<ComponentResult<_>>()?;
        Ok(())
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        let mut vol = self.vol_extra;
        for &id in &self.ids {
            vol += ctx.capacitive(id)?.volume();
        }
        self.body.state.vol = vol;
        self.body.update(ctx.guard)?;

        let pres = self.body.state.pres;
        for &id in &self.ids {
            ctx.capacitive_mut(id)?.add_external_pressure(pres);
        }
        Ok(StepOutcome::Done)
    }

    fn as_capacitive(&self) -> Option<&dyn Capacitive> {
        Some(self)
    }

    fn as_capacitive_mut(&mut self) -> Option<&mut dyn Capacitive> {
        Some(self)
    }
}

impl Capacitive for Container {
    fn volume(&self) -> f64 {
        self.body.state.vol
    }

    fn pressure(&self) -> f64 {
        self.body.state.pres
    }

    fn pres_in(&self) -> f64 {
        self.body.state.pres_in
    }

    fn pres_tm(&self) -> f64 {
        self.body.state.pres_tm
    }

    fn volume_in(&mut self, dv: f64, _source: Option<&BloodContent>) {
        if self.body.state.fixed_composition {
            return;
        }
        self.vol_extra += dv;
        self.body.state.vol += dv;
    }

    fn volume_out(&mut self, dv: f64) -> f64 {
        if self.body.state.fixed_composition {
            return 0.0;
        }
        let taken = dv.min(self.vol_extra.max(0.0));
        self.vol_extra -= taken;
        self.body.state.vol -= taken;
        dv - taken
    }

    fn add_external_pressure(&mut self, p: f64) {
        self.body.add_external_pressure(p);
    }
}
