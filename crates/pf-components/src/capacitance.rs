//! Passive elastic compartment.
//!
//! Recoil pressure follows `k·(v − u)² + el·(v − u)` with effective
//! elastance, nonlinear coefficient and unstressed volume each composed from a
//! base value and its [`Factor`] channels.

use pf_bloodgas::BloodContent;
use pf_core::AttrValue;

use crate::common::{self, guard_volume, number, unknown};
use crate::context::{TickContext, VolumeGuard};
use crate::error::ComponentResult;
use crate::factor::Factor;
use crate::traits::{Capacitive, Component, ComponentMeta, StepOutcome};

/// Volume and pressure bookkeeping shared by every compartment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeState {
    /// Volume (L)
    pub vol: f64,
    /// Total pressure (mmHg)
    pub pres: f64,
    /// Recoil pressure (mmHg)
    pub pres_in: f64,
    /// Transmural pressure (mmHg)
    pub pres_tm: f64,
    /// External pressure accumulated since the last `calc` (mmHg)
    pub pres_ext: f64,
    /// Boundary compartment: volume and composition never change.
    pub fixed_composition: bool,
}

impl VolumeState {
    pub const KEYS: [&'static str; 3] = ["vol", "pres_ext", "fixed_composition"];

    pub fn volume_in(&mut self, dv: f64) {
        if self.fixed_composition {
            return;
        }
        self.vol += dv;
    }

    pub fn volume_out(&mut self, dv: f64) -> f64 {
        if self.fixed_composition {
            return 0.0;
        }
        self.vol -= dv;
        if self.vol < 0.0 {
            let shortfall = -self.vol;
            self.vol = 0.0;
            shortfall
        } else {
            0.0
        }
    }

    /// Derive total and transmural pressure from `pres_in` and consume the
    /// external pressure accumulator.
    pub fn settle(&mut self, pres_in: f64) {
        self.pres_in = pres_in;
        self.pres_tm = pres_in - self.pres_ext;
        self.pres = pres_in + self.pres_ext;
        self.pres_ext = 0.0;
    }

    pub fn set(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        match key {
            "vol" => self.vol = number(key, value)?,
            "pres_ext" => self.pres_ext = number(key, value)?,
            "fixed_composition" => self.fixed_composition = common::flag(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn get(&self, key: &str) -> Option<AttrValue> {
        let v = match key {
            "vol" => self.vol,
            "pres" => self.pres,
            "pres_in" => self.pres_in,
            "pres_tm" => self.pres_tm,
            "pres_ext" => self.pres_ext,
            "fixed_composition" => return Some(AttrValue::Bool(self.fixed_composition)),
            _ => return None,
        };
        Some(AttrValue::Number(v))
    }
}

#[derive(Clone, Debug)]
pub struct Capacitance {
    meta: ComponentMeta,
    pub state: VolumeState,
    /// Unstressed volume (L)
    pub u_vol: f64,
    /// Base elastance (mmHg/L)
    pub el_base: f64,
    /// Nonlinear elastance coefficient (mmHg/L²)
    pub el_k: f64,
    pub u_vol_factor: Factor,
    pub el_base_factor: Factor,
    pub el_k_factor: Factor,
    el: f64,
}

impl Capacitance {
    pub const MODEL_TYPE: &'static str = "Capacitance";

    const KEYS: [&'static str; 9] = [
        "u_vol",
        "el_base",
        "el_k",
        "u_vol_factor",
        "u_vol_factor_ps",
        "el_base_factor",
        "el_base_factor_ps",
        "el_k_factor",
        "el_k_factor_ps",
    ];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(name),
            state: VolumeState::default(),
            u_vol: 0.0,
            el_base: 0.0,
            el_k: 0.0,
            u_vol_factor: Factor::default(),
            el_base_factor: Factor::default(),
            el_k_factor: Factor::default(),
            el: 0.0,
        }
    }

    pub fn with_volume(mut self, vol: f64) -> Self {
        self.state.vol = vol;
        self
    }

    pub fn with_elastance(mut self, el_base: f64, el_k: f64) -> Self {
        self.el_base = el_base;
        self.el_k = el_k;
        self
    }

    pub fn with_unstressed_volume(mut self, u_vol: f64) -> Self {
        self.u_vol = u_vol;
        self
    }

    /// Effective elastance of the last update.
    pub fn elastance(&self) -> f64 {
        self.el
    }

    /// One pressure update: compose, reset, guard, recoil, settle.
    pub fn update(&mut self, guard: VolumeGuard) -> ComponentResult<()> {
        self.el = self.el_base_factor.apply(self.el_base);
        let el_k = self.el_k_factor.apply(self.el_k);
        let u_vol = self.u_vol_factor.apply(self.u_vol);

        self.el_base_factor.reset();
        self.el_k_factor.reset();
        self.u_vol_factor.reset();

        guard_volume(&self.meta.name, &mut self.state.vol, guard)?;

        let stretch = self.state.vol - u_vol;
        let pres_in = el_k * stretch * stretch + self.el * stretch;
        common::check_finite(pres_in, "capacitance pressure")?;
        self.state.settle(pres_in);
        Ok(())
    }

    pub(crate) fn set(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        if self.state.set(key, value)? {
            return Ok(true);
        }
        match key {
            "u_vol" => self.u_vol = number(key, value)?,
            "el_base" => self.el_base = number(key, value)?,
            "el_k" => self.el_k = number(key, value)?,
            "u_vol_factor" => self.u_vol_factor.np = number(key, value)?,
            "u_vol_factor_ps" => self.u_vol_factor.ps = number(key, value)?,
            "el_base_factor" => self.el_base_factor.np = number(key, value)?,
            "el_base_factor_ps" => self.el_base_factor.ps = number(key, value)?,
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
            "el_base" => self.el_base,
            "el_k" => self.el_k,
            "el" => self.el,
            "u_vol_factor" => self.u_vol_factor.np,
            "u_vol_factor_ps" => self.u_vol_factor.ps,
            "el_base_factor" => self.el_base_factor.np,
            "el_base_factor_ps" => self.el_base_factor.ps,
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

impl Component for Capacitance {
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

impl Capacitive for Capacitance {
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
}
