//! Compartments that carry blood composition.
//!
//! [`Blood`] wraps an elastic compartment and adds transported content
//! (total O2, total CO2, solutes) plus a blood-gas snapshot. Incoming volume
//! is mixed volume-weighted with what the compartment already holds. The
//! snapshot is solved once when the compartment is initialized, then every
//! `bg_interval` seconds, or on demand when the interval is zero. A failed
//! solve keeps the previous snapshot.

use std::collections::BTreeMap;

use pf_bloodgas::{
    BloodContent, BloodGas, BloodGasError, BloodGasResult, BloodSample, Solutes, solve_blood_gas,
};
use pf_core::AttrValue;
use pf_core::units::constants;
use tracing::{debug, warn};

use crate::capacitance::{Capacitance, VolumeState};
use crate::common::{non_negative, number, unknown};
use crate::context::{TickContext, VolumeGuard};
use crate::elastance::TimeVaryingElastance;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{
    Capacitive, Component, ComponentMeta, NumericWarning, RegistryHandle, StepOutcome,
};

/// An elastic compartment that [`Blood`] can wrap.
pub trait Elastic: Component + Capacitive {
    fn volume_state(&self) -> &VolumeState;

    /// Pressure update for one tick.
    fn update_pressure(&mut self, guard: VolumeGuard) -> ComponentResult<()>;

    /// Set an attribute; `Ok(false)` if the key is not one of this type's.
    fn set_elastic(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool>;

    fn get_elastic(&self, key: &str) -> Option<AttrValue>;

    fn elastic_keys(&self) -> Vec<&'static str>;
}

impl Elastic for Capacitance {
    fn volume_state(&self) -> &VolumeState {
        &self.state
    }

    fn update_pressure(&mut self, guard: VolumeGuard) -> ComponentResult<()> {
        self.update(guard)
    }

    fn set_elastic(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        self.set(key, value)
    }

    fn get_elastic(&self, key: &str) -> Option<AttrValue> {
        self.get(key)
    }

    fn elastic_keys(&self) -> Vec<&'static str> {
        Capacitance::keys()
    }
}

impl Elastic for TimeVaryingElastance {
    fn volume_state(&self) -> &VolumeState {
        &self.state
    }

    fn update_pressure(&mut self, guard: VolumeGuard) -> ComponentResult<()> {
        self.update(guard)
    }

    fn set_elastic(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        self.set(key, value)
    }

    fn get_elastic(&self, key: &str) -> Option<AttrValue> {
        self.get(key)
    }

    fn elastic_keys(&self) -> Vec<&'static str> {
        TimeVaryingElastance::keys()
    }
}

/// Transported content and the derived blood-gas snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct BloodComposition {
    pub content: BloodContent,
    /// Celsius
    pub temp: f64,
    /// Seconds between automatic blood-gas updates; 0 disables them.
    pub bg_interval: f64,
    bg_timer: f64,
    gas: Option<BloodGas>,
    failures: u64,
}

impl Default for BloodComposition {
    fn default() -> Self {
        Self {
            content: BloodContent::default(),
            temp: constants::BODY_TEMP_C,
            bg_interval: 0.0,
            bg_timer: 0.0,
            gas: None,
            failures: 0,
        }
    }
}

impl BloodComposition {
    const KEYS: [&'static str; 5] = ["to2", "tco2", "solutes", "temp", "bg_interval"];

    /// Last successful blood-gas solution.
    pub fn gas(&self) -> Option<&BloodGas> {
        self.gas.as_ref()
    }

    /// Failed solves so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Solve now. On failure the previous snapshot is kept.
    pub fn update(&mut self) -> BloodGasResult<()> {
        let sample = BloodSample::from_content(&self.content, self.temp);
        let gas = solve_blood_gas(&sample, self.gas.as_ref())?;
        self.gas = Some(gas);
        Ok(())
    }

    /// Advance the update timer; returns the error of a failed automatic update.
    fn tick(&mut self, owner: &str, dt: f64) -> Option<BloodGasError> {
        if self.bg_interval <= 0.0 {
            return None;
        }
        self.bg_timer += dt;
        if self.bg_timer < self.bg_interval {
            return None;
        }
        self.bg_timer = 0.0;
        match self.update() {
            Ok(()) => None,
            Err(e) => {
                self.failures += 1;
                if self.failures == 1 {
                    warn!(component = owner, error = %e, "blood gas update failed, keeping previous values");
                } else {
                    debug!(component = owner, error = %e, failures = self.failures, "blood gas update failed");
                }
                Some(e)
            }
        }
    }

    fn set(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        match key {
            "to2" => self.content.to2 = non_negative(key, value)?,
            "tco2" => self.content.tco2 = non_negative(key, value)?,
            "temp" => self.temp = number(key, value)?,
            "bg_interval" => self.bg_interval = non_negative(key, value)?,
            "solutes" => {
                let map = value.as_map().map_err(|e| ComponentError::AttrType {
                    key: key.to_string(),
                    source: e,
                })?;
                let mut solutes: Solutes = self.content.solutes;
                for (name, v) in map {
                    if !v.is_finite() || !solutes.set_by_name(name, *v) {
                        return Err(ComponentError::InvalidValue {
                            key: format!("solutes.{name}"),
                            reason: "unknown solute or non-finite concentration",
                        });
                    }
                }
                self.content.solutes = solutes;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn get(&self, key: &str) -> Option<AttrValue> {
        let v = match key {
            "to2" => self.content.to2,
            "tco2" => self.content.tco2,
            "temp" => self.temp,
            "bg_interval" => self.bg_interval,
            "solutes" => {
                let map: BTreeMap<String, f64> = self.content.solutes.to_map();
                return Some(AttrValue::Map(map));
            }
            "ph" => self.gas?.ph,
            "pco2" => self.gas?.pco2,
            "po2" => self.gas?.po2,
            "so2" => self.gas?.so2,
            "hco3" => self.gas?.hco3,
            "be" => self.gas?.be,
            _ => return None,
        };
        Some(AttrValue::Number(v))
    }
}

/// Elastic compartment with blood content.
#[derive(Clone, Debug)]
pub struct Blood<C> {
    model_type: &'static str,
    pub inner: C,
    pub blood: BloodComposition,
}

pub type BloodCapacitance = Blood<Capacitance>;
pub type BloodTimeVaryingElastance = Blood<TimeVaryingElastance>;

impl Blood<Capacitance> {
    pub const MODEL_TYPE: &'static str = "BloodCapacitance";

    pub fn new(name: impl Into<String>) -> Self {
        Self::wrap(Self::MODEL_TYPE, Capacitance::new(name))
    }
}

impl Blood<TimeVaryingElastance> {
    pub const MODEL_TYPE: &'static str = "BloodTimeVaryingElastance";

    pub fn new(name: impl Into<String>) -> Self {
        Self::wrap(Self::MODEL_TYPE, TimeVaryingElastance::new(name))
    }
}

impl<C: Elastic> Blood<C> {
    pub fn wrap(model_type: &'static str, inner: C) -> Self {
        Self {
            model_type,
            inner,
            blood: BloodComposition::default(),
        }
    }
}

impl<C: Elastic> Component for Blood<C> {
    fn meta(&self) -> &ComponentMeta {
        self.inner.meta()
    }

    fn meta_mut(&mut self) -> &mut ComponentMeta {
        self.inner.meta_mut()
    }

    fn model_type(&self) -> &'static str {
        self.model_type
    }

    fn set_attribute(&mut self, key: &str, value: &AttrValue) -> ComponentResult<()> {
        if self.blood.set(key, value)? || self.inner.set_elastic(key, value)? {
            Ok(())
        } else {
            Err(unknown(self.name(), key))
        }
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.blood.get(key).or_else(|| self.inner.get_elastic(key))
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        let mut keys = self.inner.elastic_keys();
        keys.extend(BloodComposition::KEYS);
        keys
    }

    fn resolve(&mut self, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        self.inner.resolve(registry)?;
        if self.blood.gas.is_none() {
            // readable from the first tick; stays unset only if this fails
            if let Err(e) = self.blood.update() {
                warn!(component = self.inner.name(), error = %e, "initial blood gas solve failed");
            }
        }
        Ok(())
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        self.inner.update_pressure(ctx.guard)?;
        let name = self.inner.name();
        match self.blood.tick(name, ctx.dt) {
            Some(error) => Ok(StepOutcome::Warning(NumericWarning {
                component: name.to_string(),
                error,
            })),
            None => Ok(StepOutcome::Done),
        }
    }

    fn as_capacitive(&self) -> Option<&dyn Capacitive> {
        Some(self)
    }

    fn as_capacitive_mut(&mut self) -> Option<&mut dyn Capacitive> {
        Some(self)
    }
}

impl<C: Elastic> Capacitive for Blood<C> {
    fn volume(&self) -> f64 {
        self.inner.volume()
    }

    fn pressure(&self) -> f64 {
        self.inner.pressure()
    }

    fn pres_in(&self) -> f64 {
        self.inner.pres_in()
    }

    fn pres_tm(&self) -> f64 {
        self.inner.pres_tm()
    }

    fn volume_in(&mut self, dv: f64, source: Option<&BloodContent>) {
        if self.inner.volume_state().fixed_composition {
            return;
        }
        if let Some(src) = source {
            self.blood.content.mix_in(self.inner.volume(), src, dv);
        }
        self.inner.volume_in(dv, None);
    }

    fn volume_out(&mut self, dv: f64) -> f64 {
        self.inner.volume_out(dv)
    }

    fn add_external_pressure(&mut self, p: f64) {
        self.inner.add_external_pressure(p);
    }

    fn set_activation(&mut self, activation: f64) {
        self.inner.set_activation(activation);
    }

    fn content(&self) -> Option<BloodContent> {
        Some(self.blood.content)
    }

    fn update_blood_gas(&mut self) -> BloodGasResult<()> {
        self.blood.update()
    }
}
