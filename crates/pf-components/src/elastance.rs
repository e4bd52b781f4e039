//! Time-varying elastance compartment (cardiac chamber).

use pf_bloodgas::BloodContent;
use pf_core::AttrValue;

use crate::capacitance::VolumeState;
use crate::common::{self, guard_volume, number, unknown};
use crate::context::{TickContext, VolumeGuard};
use crate::error::{ComponentError, ComponentResult};
use crate::factor::Factor;
use crate::traits::{Capacitive, Component, ComponentMeta, StepOutcome};

/// Blends an end-diastolic and an end-systolic pressure-volume relation by an
/// activation in `[0, 1]` supplied by a cardiac timing controller.
#[derive(Clone, Debug)]
pub struct TimeVaryingElastance {
    meta: ComponentMeta,
    pub state: VolumeState,
    pub u_vol: f64,
    /// Diastolic elastance (mmHg/L)
    pub el_min: f64,
    /// Systolic elastance (mmHg/L)
    pub el_max: f64,
    /// Diastolic nonlinear coefficient (mmHg/L²)
    pub el_k: f64,
    pub activation: f64,
    pub u_vol_factor: Factor,
    pub el_min_factor: Factor,
    pub el_max_factor: Factor,
    pub el_k_factor: Factor,
    pres_ed: f64,
    pres_ms: f64,
}

impl TimeVaryingElastance {
    pub const MODEL_TYPE: &'static str = "TimeVaryingElastance";

    const KEYS: [&'static str; 13] = [
        "u_vol",
        "el_min",
        "el_max",
        "el_k",
        "activation",
        "u_vol_factor",
        "u_vol_factor_ps",
        "el_min_factor",
        "el_min_factor_ps",
        "el_max_factor",
        "el_max_factor_ps",
        "el_k_factor",
        "el_k_factor_ps",
    ];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(name),
            state: VolumeState::default(),
            u_vol: 0.0,
            el_min: 0.0,
            el_max: 0.0,
            el_k: 0.0,
            activation: 0.0,
            u_vol_factor: Factor::default(),
            el_min_factor: Factor::default(),
            el_max_factor: Factor::default(),
            el_k_factor: Factor::default(),
            pres_ed: 0.0,
            pres_ms: 0.0,
        }
    }

    pub fn with_volume(mut self, vol: f64) -> Self {
        self.state.vol = vol;
        self
    }

    pub fn with_elastances(mut self, el_min: f64, el_max: f64, el_k: f64) -> Self {
        self.el_min = el_min;
        self.el_max = el_max;
        self.el_k = el_k;
        self
    }

    pub fn update(&mut self, guard: VolumeGuard) -> ComponentResult<()> {
        let el_min = self.el_min_factor.apply(self.el_min);
        // systole is never softer than diastole
        let el_max = self.el_max_factor.apply(self.el_max).max(el_min);
        let el_k = self.el_k_factor.apply(self.el_k);
        let u_vol = self.u_vol_factor.apply(self.u_vol);

        self.el_min_factor.reset();
        self.el_max_factor.reset();
        self.el_k_factor.reset();
        self.u_vol_factor.reset();

        guard_volume(&self.meta.name, &mut self.state.vol, guard)?;

        let stretch = self.state.vol - u_vol;
        self.pres_ed = el_k * stretch * stretch + el_min * stretch;
        self.pres_ms = el_max * stretch;
        let pres_in = self.activation * (self.pres_ms - self.pres_ed) + self.pres_ed;
        common::check_finite(pres_in, "elastance pressure")?;
        self.state.settle(pres_in);
        Ok(())
    }

    pub(crate) fn set(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        if self.state.set(key, value)? {
            return Ok(true);
        }
        match key {
            "u_vol" => self.u_vol = number(key, value)?,
            "el_min" => self.el_min = number(key, value)?,
            "el_max" => self.el_max = number(key, value)?,
            "el_k" => self.el_k = number(key, value)?,
            "activation" => self.activation = activation(key, value)?,
            "u_vol_factor" => self.u_vol_factor.np = number(key, value)?,
            "u_vol_factor_ps" => self.u_vol_factor.ps = number(key, value)?,
            "el_min_factor" => self.el_min_factor.np = number(key, value)?,
            "el_min_factor_ps" => self.el_min_factor.ps = number(key, value)?,
            "el_max_factor" => self.el_max_factor.np = number(key, value)?,
            "el_max_factor_ps" => self.el_max_factor.ps = number(key, value)?,
            "el_k_factor" => self.el_k_factor.np = number(key, value)?,
            "el_k_factor_ps" => self.el_k_factor.ps = number(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn get(&self, key: &str) -> Option<AttrValue> {
        if let Some(v) = self.state.get(key) {
            return Some(v);
        }
        let v = match key {
            "u_vol" => self.u_vol,
            "el_min" => self.el_min,
            "el_max" => self.el_max,
            "el_k" => self.el_k,
            "activation" => self.activation,
            "pres_ed" => self.pres_ed,
            "pres_ms" => self.pres_ms,
            "u_vol_factor" => self.u_vol_factor.np,
            "u_vol_factor_ps" => self.u_vol_factor.ps,
            "el_min_factor" => self.el_min_factor.np,
            "el_min_factor_ps" => self.el_min_factor.ps,
            "el_max_factor" => self.el_max_factor.np,
            "el_max_factor_ps" => self.el_max_factor.ps,
            "el_k_factor" => self.el_k_factor.np,
            "el_k_factor_ps" => self.el_k_factor.ps,
            _ => return None,
        };
        Some(AttrValue::Number(v))
    }

    pub(crate) fn keys() -> Vec<&'static str> {
        VolumeState::KEYS.iter().chain(Self::KEYS.iter()).copied().collect()
    }
}

fn activation(key: &str, value: &AttrValue) -> ComponentResult<f64> {
    let a = number(key, value)?;
    if !(0.0..=1.0).contains(&a) {
        return Err(ComponentError::InvalidValue {
            key: key.to_string(),
            reason: "must lie in [0, 1]",
        });
    }
    Ok(a)
}

impl Component for TimeVaryingElastance {
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
        if self.set(key, value)? {
            Ok(())
        } else {
            Err(unknown(&self.meta.name, key))
        }
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.get(key)
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        Self::keys()
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        self.update(ctx.guard)?;
        Ok(StepOutcome::Done)
    }

    fn as_capacitive(&self) -> Option<&dyn Capacitive> {
        Some(self)
    }

    fn as_capacitive_mut(&mut self) -> Option<&mut dyn Capacitive> {
        Some(self)
    }
}

impl Capacitive for TimeVaryingElastance {
    fn volume(&self) -> f64 {
        self.state.vol
    }

    fn pressure(&self) -> f64 {
        self.state.pres
    }

    fn pres_in(&self) -> f64 {
        self.state.pres_in
    }

    fn pres_tm(&self) -> f64 {
        self.state.pres_tm
    }

    fn volume_in(&mut self, dv: f64, _source: Option<&BloodContent>) {
        self.state.volume_in(dv);
    }

    fn volume_out(&mut self, dv: f64) -> f64 {
        self.state.volume_out(dv)
    }

    fn add_external_pressure(&mut self, p: f64) {
        self.state.pres_ext += p;
    }

    fn set_activation(&mut self, activation: f64) {
        self.activation = activation.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ComponentSlots;

    fn tick(c: &mut TimeVaryingElastance) {
        let mut slots = ComponentSlots::default();
        let mut ctx = TickContext::new(0.0005, 0.0, VolumeGuard::Abort, &mut slots);
        c.calc(&mut ctx).unwrap();
    }

    #[test]
    fn activation_blends_relations() {
        let mut c = TimeVaryingElastance::new("LV")
            .with_volume(0.1)
            .with_elastances(50.0, 2000.0, 0.0);

        tick(&mut c);
        assert!((c.pres_in() - 5.0).abs() < 1e-12);

        c.set_activation(1.0);
        tick(&mut c);
        assert!((c.pres_in() - 200.0).abs() < 1e-12);

        c.set_activation(0.5);
        tick(&mut c);
        assert!((c.pres_in() - 102.5).abs() < 1e-12);
    }

    #[test]
    fn el_max_never_drops_below_el_min() {
        let mut c = TimeVaryingElastance::new("LV")
            .with_volume(0.1)
            .with_elastances(100.0, 150.0, 0.0);
        c.el_max_factor.np = 0.2;
        c.set_activation(1.0);
        tick(&mut c);
        // el_max would be 30, clamped to el_min = 100
        assert!((c.pres_in() - 10.0).abs() < 1e-12);
        assert_eq!(c.el_max_factor.np, 1.0);
    }

    #[test]
    fn activation_attribute_is_range_checked() {
        let mut c = TimeVaryingElastance::new("LV");
        assert!(c.set_attribute("activation", &AttrValue::from(1.5)).is_err());
        c.set_attribute("activation", &AttrValue::from(0.3)).unwrap();
        assert_eq!(c.activation, 0.3);
    }
}
