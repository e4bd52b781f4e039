//! Core traits for simulated elements.

use std::fmt;

use pf_bloodgas::{BloodContent, BloodGasError, BloodGasResult};
use pf_core::{AttrValue, CompId};

use crate::common;
use crate::context::TickContext;
use crate::error::ComponentResult;

/// Identity and lifecycle flags shared by every component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentMeta {
    pub name: String,
    pub enabled: bool,
    pub initialized: bool,
}

impl ComponentMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            initialized: false,
        }
    }
}

/// A blood-gas update that was skipped; the previous snapshot stays valid.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericWarning {
    pub component: String,
    pub error: BloodGasError,
}

impl fmt::Display for NumericWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.error)
    }
}

/// Result of one `step`.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Done,
    /// Disabled or not yet initialized.
    Skipped,
    Warning(NumericWarning),
}

/// Name resolution against the component registry.
pub trait RegistryHandle {
    fn lookup(&self, name: &str) -> Option<CompId>;

    /// `None` for an unknown id or a slot whose component is currently
    /// checked out.
    fn component(&self, id: CompId) -> Option<&dyn Component>;
}

/// Every simulated element implements this.
///
/// Attributes are reached by string key so that a declarative build spec and
/// dotted-path property access can set and read them. Cross-references to
/// other components are resolved once in [`Component::resolve`] and cached as
/// [`CompId`]s; `calc` never looks names up.
pub trait Component: Send + fmt::Debug {
    fn meta(&self) -> &ComponentMeta;

    fn meta_mut(&mut self) -> &mut ComponentMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }

    /// Type tag this component was built from.
    fn model_type(&self) -> &'static str;

    /// Set one independent attribute. Unknown keys are an error.
    fn set_attribute(&mut self, key: &str, value: &AttrValue) -> ComponentResult<()>;

    /// Read an independent or derived attribute.
    fn attribute(&self, key: &str) -> Option<AttrValue>;

    /// Keys accepted by `set_attribute`, in a stable order.
    fn attribute_keys(&self) -> Vec<&'static str>;

    /// Resolve name references. Called once, after every component exists.
    fn resolve(&mut self, _registry: &dyn RegistryHandle) -> ComponentResult<()> {
        Ok(())
    }

    /// Advance one tick.
    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome>;

    fn as_capacitive(&self) -> Option<&dyn Capacitive> {
        None
    }

    fn as_capacitive_mut(&mut self) -> Option<&mut dyn Capacitive> {
        None
    }
}

/// Pressure/volume compartment that connectors move volume between.
pub trait Capacitive {
    fn volume(&self) -> f64;

    /// Total pressure: recoil plus external.
    fn pressure(&self) -> f64;

    /// Recoil pressure.
    fn pres_in(&self) -> f64;

    /// Transmural pressure.
    fn pres_tm(&self) -> f64;

    /// Add `dv`, blending composition from `source` when both sides carry
    /// blood. No-op for fixed-composition compartments.
    fn volume_in(&mut self, dv: f64, source: Option<&BloodContent>);

    /// Remove `dv`; returns the part that could not be removed because the
    /// compartment would have gone negative.
    fn volume_out(&mut self, dv: f64) -> f64;

    /// Accumulate external pressure for the next `calc`.
    fn add_external_pressure(&mut self, p: f64);

    /// Cardiac activation in `[0, 1]`; ignored by passive compartments.
    fn set_activation(&mut self, _activation: f64) {}

    fn content(&self) -> Option<BloodContent> {
        None
    }

    /// Recompute the blood-gas snapshot now.
    fn update_blood_gas(&mut self) -> BloodGasResult<()> {
        Ok(())
    }
}

/// Write an attribute, including the lifecycle keys every component shares.
pub fn write_attribute(
    component: &mut dyn Component,
    key: &str,
    value: &AttrValue,
) -> ComponentResult<()> {
    match key {
        "is_enabled" => {
            component.meta_mut().enabled = common::flag(key, value)?;
            Ok(())
        }
        _ => component.set_attribute(key, value),
    }
}

/// Read an attribute, including the lifecycle keys every component shares.
pub fn read_attribute(component: &dyn Component, key: &str) -> Option<AttrValue> {
    match key {
        "name" => Some(AttrValue::Text(component.name().to_string())),
        "model_type" => Some(AttrValue::Text(component.model_type().to_string())),
        "is_enabled" => Some(AttrValue::Bool(component.meta().enabled)),
        "is_initialized" => Some(AttrValue::Bool(component.meta().initialized)),
        _ => component.attribute(key),
    }
}

/// Merge `args` into the component's attributes, resolve its references and
/// mark it initialized.
pub fn init<'a, I, K>(
    component: &mut dyn Component,
    args: I,
    registry: &dyn RegistryHandle,
) -> ComponentResult<()>
where
    I: IntoIterator<Item = (K, &'a AttrValue)>,
    K: AsRef<str>,
{
    for (key, value) in args {
        write_attribute(component, key.as_ref(), value)?;
    }
    component.resolve(registry)?;
    component.meta_mut().initialized = true;
    Ok(())
}

/// Run `calc` if the component is enabled and initialized.
pub fn step(component: &mut dyn Component, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
    let meta = component.meta();
    if !(meta.enabled && meta.initialized) {
        return Ok(StepOutcome::Skipped);
    }
    component.calc(ctx)
}
