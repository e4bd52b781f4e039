//! Pressure-driven connectors between two compartments.

use pf_core::{AttrValue, CompId};

use crate::common::{self, flag, number, positive, resolve_capacitive, text, transfer_volume, unknown};
use crate::context::TickContext;
use crate::error::{ComponentError, ComponentResult};
use crate::factor::Factor;
use crate::traits::{Component, ComponentMeta, RegistryHandle, StepOutcome};

/// Endpoints, resistances and gating shared by [`Resistor`] and
/// [`crate::Valve`].
#[derive(Clone, Debug)]
pub struct Connector {
    pub comp_from: String,
    pub comp_to: String,
    from: Option<CompId>,
    to: Option<CompId>,
    /// Forward resistance (mmHg·s/L)
    pub r_for: f64,
    /// Backward resistance (mmHg·s/L)
    pub r_back: f64,
    /// Quadratic resistance coefficient, added as `r_k·q²` (mmHg·s³/L³)
    pub r_k: f64,
    pub no_flow: bool,
    pub no_back_flow: bool,
    /// Injected pressure on the `from` side, consumed each tick
    pub p1_ext: f64,
    /// Injected pressure on the `to` side, consumed each tick
    pub p2_ext: f64,
    pub r_for_factor: Factor,
    pub r_back_factor: Factor,
    pub r_k_factor: Factor,
    /// Flow of the last tick (L/s), positive from `from` to `to`
    pub flow: f64,
    p1: f64,
    p2: f64,
}

impl Default for Connector {
    fn default() -> Self {
        Self {
            comp_from: String::new(),
            comp_to: String::new(),
            from: None,
            to: None,
            r_for: 1.0,
            r_back: 1.0,
            r_k: 0.0,
            no_flow: false,
            no_back_flow: false,
            p1_ext: 0.0,
            p2_ext: 0.0,
            r_for_factor: Factor::default(),
            r_back_factor: Factor::default(),
            r_k_factor: Factor::default(),
            flow: 0.0,
            p1: 0.0,
            p2: 0.0,
        }
    }
}

/// How a connector treats a reversed gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BackFlow {
    /// Through `r_back`, unless `no_back_flow` is set.
    Resistive,
    /// Never.
    Blocked,
}

impl Connector {
    pub(crate) const KEYS: [&'static str; 16] = [
        "comp_from",
        "comp_to",
        "r_for",
        "r_back",
        "r_k",
        "no_flow",
        "no_back_flow",
        "p1_ext",
        "p2_ext",
        "r_for_factor",
        "r_for_factor_ps",
        "r_back_factor",
        "r_back_factor_ps",
        "r_k_factor",
        "r_k_factor_ps",
        "flow",
    ];

    pub fn endpoints(&self) -> Option<(CompId, CompId)> {
        Some((self.from?, self.to?))
    }

    pub(crate) fn resolve(&mut self, owner: &str, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        self.from = Some(resolve_capacitive(owner, &self.comp_from, registry)?);
        self.to = Some(resolve_capacitive(owner, &self.comp_to, registry)?);
        Ok(())
    }

    /// Flow for this tick. `memory` is the flow fed into the quadratic term.
    pub(crate) fn compute_flow(
        &mut self,
        owner: &str,
        ctx: &TickContext<'_>,
        memory: f64,
        back: BackFlow,
    ) -> ComponentResult<f64> {
        let (from, to) = self.endpoints().ok_or_else(|| ComponentError::UnresolvedReference {
            component: owner.to_string(),
            target: format!("{} -> {}", self.comp_from, self.comp_to),
        })?;

        self.p1 = ctx.capacitive(from)?.pressure() + self.p1_ext;
        self.p2 = ctx.capacitive(to)?.pressure() + self.p2_ext;
        self.p1_ext = 0.0;
        self.p2_ext = 0.0;

        let r_for = self.r_for_factor.apply(self.r_for);
        let r_back = self.r_back_factor.apply(self.r_back);
        let r_k = self.r_k_factor.apply(self.r_k);
        self.r_for_factor.reset();
        self.r_back_factor.reset();
        self.r_k_factor.reset();

        let quadratic = r_k * memory * memory;
        let dp = self.p1 - self.p2;
        let flow = match common::flow_direction(self.p1, self.p2) {
            _ if self.no_flow => 0.0,
            d if d > 0.0 => {
                let r = r_for + quadratic;
                if r <= 0.0 {
                    return Err(ComponentError::NonPhysical {
                        what: "forward resistance",
                    });
                }
                dp / r
            }
            d if d < 0.0 => {
                if back == BackFlow::Blocked || self.no_back_flow {
                    0.0
                } else {
                    let r = r_back + quadratic;
                    if r <= 0.0 {
                        return Err(ComponentError::NonPhysical {
                            what: "backward resistance",
                        });
                    }
                    dp / r
                }
            }
            _ => 0.0,
        };
        common::check_finite(flow, "connector flow")?;
        self.flow = flow;
        Ok(flow)
    }

    /// Move `flow·dt` between the endpoints.
    pub(crate) fn transfer(&self, ctx: &mut TickContext<'_>) -> ComponentResult<()> {
        let Some((from, to)) = self.endpoints() else {
            return Ok(());
        };
        let dv = self.flow * ctx.dt;
        if dv > 0.0 {
            transfer_volume(ctx, from, to, dv)?;
        } else if dv < 0.0 {
            transfer_volume(ctx, to, from, -dv)?;
        }
        Ok(())
    }

    pub(crate) fn set(&mut self, key: &str, value: &AttrValue) -> ComponentResult<bool> {
        match key {
            "comp_from" => {
                self.comp_from = text(key, value)?;
                self.from = None;
            }
            "comp_to" => {
                self.comp_to = text(key, value)?;
                self.to = None;
            }
            "r_for" => self.r_for = positive(key, value)?,
            "r_back" => self.r_back = positive(key, value)?,
            "r_k" => self.r_k = common::non_negative(key, value)?,
            "no_flow" => self.no_flow = flag(key, value)?,
            "no_back_flow" => self.no_back_flow = flag(key, value)?,
            "p1_ext" => self.p1_ext = number(key, value)?,
            "p2_ext" => self.p2_ext = number(key, value)?,
            "r_for_factor" => self.r_for_factor.np = number(key, value)?,
            "r_for_factor_ps" => self.r_for_factor.ps = number(key, value)?,
            "r_back_factor" => self.r_back_factor.np = number(key, value)?,
            "r_back_factor_ps" => self.r_back_factor.ps = number(key, value)?,
            "r_k_factor" => self.r_k_factor.np = number(key, value)?,
            "r_k_factor_ps" => self.r_k_factor.ps = number(key, value)?,
            "flow" => self.flow = number(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn get(&self, key: &str) -> Option<AttrValue> {
        let v = match key {
            "comp_from" => return Some(AttrValue::Text(self.comp_from.clone())),
            "comp_to" => return Some(AttrValue::Text(self.comp_to.clone())),
            "no_flow" => return Some(AttrValue::Bool(self.no_flow)),
            "no_back_flow" => return Some(AttrValue::Bool(self.no_back_flow)),
            "r_for" => self.r_for,
            "r_back" => self.r_back,
            "r_k" => self.r_k,
            "p1_ext" => self.p1_ext,
            "p2_ext" => self.p2_ext,
            "r_for_factor" => self.r_for_factor.np,
            "r_for_factor_ps" => self.r_for_factor.ps,
            "r_back_factor" => self.r_back_factor.np,
            "r_back_factor_ps" => self.r_back_factor.ps,
            "r_k_factor" => self.r_k_factor.np,
            "r_k_factor_ps" => self.r_k_factor.ps,
            "flow" => self.flow,
            "p1" => self.p1,
            "p2" => self.p2,
            _ => return None,
        };
        Some(AttrValue::Number(v))
    }
}

/// Bidirectional resistor; backward flow meets `r_back` unless gated.
#[derive(Clone, Debug)]
pub struct Resistor {
    meta: ComponentMeta,
    pub connector: Connector,
}

impl Resistor {
    pub const MODEL_TYPE: &'static str = "Resistor";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(name),
            connector: Connector::default(),
        }
    }

    pub fn between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connector.comp_from = from.into();
        self.connector.comp_to = to.into();
        self
    }

    pub fn with_resistance(mut self, r_for: f64, r_back: f64) -> Self {
        self.connector.r_for = r_for;
        self.connector.r_back = r_back;
        self
    }

    pub fn flow(&self) -> f64 {
        self.connector.flow
    }
}

impl Component for Resistor {
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
        if self.connector.set(key, value)? {
            Ok(())
        } else {
            Err(unknown(&self.meta.name, key))
        }
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        self.connector.get(key)
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        Connector::KEYS.to_vec()
    }

    fn resolve(&mut self, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        self.connector.resolve(&self.meta.name, registry)
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        let memory = self.connector.flow;
        self.connector
            .compute_flow(&self.meta.name, ctx, memory, BackFlow::Resistive)?;
        self.connector.transfer(ctx)?;
        Ok(StepOutcome::Done)
    }
}
