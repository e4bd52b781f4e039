//! Component registry and fixed-step tick loop.

use std::collections::{BTreeMap, HashMap};

use pf_components::{
    Component, ComponentSlots, NumericWarning, RegistryHandle, StepOutcome, TickContext,
    VolumeGuard, init, read_attribute, step, write_attribute,
};
use pf_core::timing::{RunStats, Timer};
use pf_core::{AttrValue, CompId};
use pf_project::{ComponentDef, ModelDef, validate_model};
use tracing::{debug, info, warn};
use uom::si::f64::Time;

use crate::error::{EngineError, EngineResult};
use crate::factory::ModelFactory;
use crate::observer::TickObserver;

/// Value returned by dotted-path access.
pub type PropertyValue = AttrValue;

/// Run options not carried by the model definition.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOptions {
    pub volume_guard: VolumeGuard,
}

/// Result of one engine tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Clean,
    /// Number of components that kept a stale blood-gas snapshot this tick.
    Warnings(usize),
}

/// Name resolution over the arena while one slot may be checked out.
struct RegistryView<'a> {
    slots: &'a ComponentSlots,
    names: &'a HashMap<String, CompId>,
}

impl RegistryHandle for RegistryView<'_> {
    fn lookup(&self, name: &str) -> Option<CompId> {
        self.names.get(name).copied()
    }

    fn component(&self, id: CompId) -> Option<&dyn Component> {
        self.slots.get(id)
    }
}

/// One flattened definition: its name, tag and init arguments.
struct Planned {
    name: String,
    model_type: String,
    args: Vec<(String, AttrValue)>,
}

/// Parents before children, in declaration order. Children are appended to
/// their parent's `contained_components`.
fn flatten(defs: &[ComponentDef], out: &mut Vec<Planned>) {
    for def in defs {
        let mut args: Vec<(String, AttrValue)> = def
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        args.push(("is_enabled".to_string(), AttrValue::Bool(def.is_enabled)));

        if !def.components.is_empty() {
            let mut contained = match def.attributes.get("contained_components") {
                Some(v) => v.as_names().unwrap_or_default(),
                None => Vec::new(),
            };
            for child in &def.components {
                if !contained.contains(&child.name) {
                    contained.push(child.name.clone());
                }
            }
            args.retain(|(k, _)| k != "contained_components");
            args.push((
                "contained_components".to_string(),
                AttrValue::Names(contained),
            ));
        }

        out.push(Planned {
            name: def.name.clone(),
            model_type: def.model_type.clone(),
            args,
        });
        flatten(&def.components, out);
    }
}

fn split_path(path: &str) -> EngineResult<(&str, &str, Option<&str>)> {
    let invalid = || EngineError::InvalidPath {
        path: path.to_string(),
    };
    let (component, rest) = path.split_once('.').ok_or_else(invalid)?;
    let (attribute, key) = match rest.split_once('.') {
        Some((a, k)) => (a, Some(k)),
        None => (rest, None),
    };
    if component.is_empty() || attribute.is_empty() || key.is_some_and(str::is_empty) {
        return Err(invalid());
    }
    Ok((component, attribute, key))
}

/// Owns every component and drives them in build order.
pub struct Engine {
    name: String,
    description: String,
    dt: f64,
    time: f64,
    ticks: u64,
    options: EngineOptions,
    slots: ComponentSlots,
    names: HashMap<String, CompId>,
    diagnostics: BTreeMap<String, u64>,
    last_warnings: Vec<NumericWarning>,
    stats: RunStats,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("dt", &self.dt)
            .field("time", &self.time)
            .field("components", &self.slots.len())
            .finish()
    }
}

impl Engine {
    /// Build with the built-in component types and default options.
    pub fn build(def: &ModelDef) -> EngineResult<Self> {
        Self::build_with(def, &ModelFactory::default(), EngineOptions::default())
    }

    /// Construct every component, then initialize every component in
    /// declaration order so references may point forward.
    pub fn build_with(
        def: &ModelDef,
        factory: &ModelFactory,
        options: EngineOptions,
    ) -> EngineResult<Self> {
        validate_model(def)?;
        let timer = Timer::start("build");

        let mut plan = Vec::new();
        flatten(&def.components, &mut plan);

        let mut slots = ComponentSlots::with_capacity(plan.len());
        let mut names = HashMap::with_capacity(plan.len());
        for entry in &plan {
            let component = factory
                .create(&entry.model_type, &entry.name)
                .ok_or_else(|| {
                    EngineError::configuration(
                        &entry.name,
                        format!("unknown model type '{}'", entry.model_type),
                    )
                })?;
            let id = slots
                .push(component)
                .map_err(|e| EngineError::configuration(&entry.name, e))?;
            names.insert(entry.name.clone(), id);
            debug!(component = %entry.name, model_type = %entry.model_type, "constructed");
        }

        for entry in &plan {
            let id = names[&entry.name];
            let mut component = slots.take(id).ok_or(EngineError::InvalidArg {
                what: "component slot checked out during build",
            })?;
            let result = {
                let view = RegistryView {
                    slots: &slots,
                    names: &names,
                };
                init(
                    component.as_mut(),
                    entry.args.iter().map(|(k, v)| (k.as_str(), v)),
                    &view,
                )
            };
            slots.restore(id, component);
            result.map_err(|e| EngineError::configuration(&entry.name, e))?;
        }

        let mut stats = RunStats::default();
        if let Some(t) = timer.stop() {
            stats.build_time_s = t;
        }
        info!(
            model = %def.name,
            components = plan.len(),
            time_step = def.time_step,
            "model built"
        );

        Ok(Self {
            name: def.name.clone(),
            description: def.description.clone(),
            dt: def.time_step,
            time: 0.0,
            ticks: 0,
            options,
            slots,
            names,
            diagnostics: BTreeMap::new(),
            last_warnings: Vec::new(),
            stats,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_step(&self) -> f64 {
        self.dt
    }

    /// Simulated time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn elapsed(&self) -> Time {
        pf_core::units::seconds(self.time)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn set_volume_guard(&mut self, guard: VolumeGuard) {
        self.options.volume_guard = guard;
    }

    /// Numeric warning count per component since build.
    pub fn diagnostics(&self) -> &BTreeMap<String, u64> {
        &self.diagnostics
    }

    /// Warnings raised by the most recent tick.
    pub fn last_warnings(&self) -> &[NumericWarning] {
        &self.last_warnings
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Components in build order.
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.slots.iter().map(|(_, c)| c)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.names.get(name).and_then(|id| self.slots.get(*id))
    }

    fn id(&self, name: &str) -> EngineResult<CompId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Step every component once, in build order.
    pub fn tick(&mut self) -> EngineResult<TickOutcome> {
        self.last_warnings.clear();
        for index in 0..self.slots.len() {
            let id = CompId::from_usize(index).ok_or(EngineError::InvalidArg {
                what: "component index out of range",
            })?;
            let Some(mut component) = self.slots.take(id) else {
                continue;
            };
            let result = {
                let mut ctx =
                    TickContext::new(self.dt, self.time, self.options.volume_guard, &mut self.slots);
                step(component.as_mut(), &mut ctx)
            };
            let failure = match result {
                Ok(StepOutcome::Warning(warning)) => {
                    *self.diagnostics.entry(warning.component.clone()).or_default() += 1;
                    self.last_warnings.push(warning);
                    None
                }
                Ok(_) => None,
                Err(e) => Some(EngineError::from_step(component.name(), e)),
            };
            self.slots.restore(id, component);

            if let Some(error) = failure {
                warn!(time = self.time, error = %error, "tick aborted");
                return Err(error);
            }
        }
        self.time += self.dt;
        self.ticks += 1;

        Ok(match self.last_warnings.len() {
            0 => TickOutcome::Clean,
            n => {
                self.stats.numeric_warnings += n as u64;
                TickOutcome::Warnings(n)
            }
        })
    }

    /// Tick for `duration` seconds, notifying `observer` after every tick.
    /// Returns the number of ticks that raised warnings.
    pub fn run(&mut self, duration: f64, observer: &mut dyn TickObserver) -> EngineResult<u64> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(EngineError::InvalidArg {
                what: "duration must be finite and non-negative",
            });
        }
        let n = (duration / self.dt).round() as u64;
        let timer = Timer::start("run");
        let mut warned = 0;
        for _ in 0..n {
            if let TickOutcome::Warnings(_) = self.tick()? {
                warned += 1;
            }
            observer.on_tick(self)?;
        }

        if let Some(t) = timer.stop() {
            self.stats.run_time_s += t;
        }
        self.stats.ticks += n;
        self.stats.simulated_s += n as f64 * self.dt;
        info!(
            model = %self.name,
            ticks = n,
            time = self.time,
            warning_ticks = warned,
            "run complete"
        );
        Ok(warned)
    }

    /// Read `Component.attribute` or `Component.attribute.key` (map entry).
    pub fn get_property(&self, path: &str) -> EngineResult<PropertyValue> {
        let (name, attribute, key) = split_path(path)?;
        let component = self.get(name).ok_or_else(|| EngineError::UnknownComponent {
            name: name.to_string(),
        })?;
        let unknown = || EngineError::UnknownProperty {
            path: path.to_string(),
        };
        let value = read_attribute(component, attribute).ok_or_else(unknown)?;
        match key {
            None => Ok(value),
            Some(key) => match value {
                AttrValue::Map(map) => map.get(key).map(|v| AttrValue::Number(*v)).ok_or_else(unknown),
                _ => Err(unknown()),
            },
        }
    }

    /// Numeric property; booleans read as 0 or 1.
    pub fn get_number(&self, path: &str) -> EngineResult<f64> {
        match self.get_property(path)? {
            AttrValue::Number(v) => Ok(v),
            AttrValue::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
            _ => Err(EngineError::InvalidArg {
                what: "property is not numeric",
            }),
        }
    }

    /// Write an attribute between ticks. References are re-resolved so a
    /// changed endpoint name takes effect on the next tick.
    pub fn set_property(&mut self, path: &str, value: impl Into<AttrValue>) -> EngineResult<()> {
        let (name, attribute, key) = split_path(path)?;
        let value: AttrValue = value.into();
        let value = match key {
            None => value,
            Some(key) => {
                let v = value
                    .as_f64()
                    .map_err(|e| EngineError::configuration(name, e))?;
                AttrValue::Map(BTreeMap::from([(key.to_string(), v)]))
            }
        };

        let id = self.id(name)?;
        let mut component = self.slots.take(id).ok_or(EngineError::InvalidArg {
            what: "component slot checked out",
        })?;
        let result = write_attribute(component.as_mut(), attribute, &value).and_then(|()| {
            if component.meta().initialized {
                let view = RegistryView {
                    slots: &self.slots,
                    names: &self.names,
                };
                component.resolve(&view)
            } else {
                Ok(())
            }
        });
        self.slots.restore(id, component);
        result.map_err(|e| EngineError::configuration(name, e))?;
        debug!(path, "property set");
        Ok(())
    }

    /// Recompute one compartment's blood-gas snapshot now.
    pub fn update_blood_gas(&mut self, name: &str) -> EngineResult<()> {
        let id = self.id(name)?;
        let capacitive = self
            .slots
            .get_mut(id)
            .and_then(|c| c.as_capacitive_mut())
            .ok_or_else(|| EngineError::configuration(name, "not a capacitive compartment"))?;
        capacitive
            .update_blood_gas()
            .map_err(|source| EngineError::BloodGas {
                component: name.to_string(),
                source,
            })
    }

    /// Snapshot every component's writable attributes as a model definition.
    ///
    /// Components are written flat, in build order; containment is carried
    /// by `contained_components`. Building the result restores the same
    /// attribute state. Controller timers and blood-gas snapshots restart.
    pub fn export_state(&self) -> ModelDef {
        let mut model = ModelDef::new(self.name.clone());
        model.time_step = self.dt;
        model.description = self.description.clone();
        model.components = self
            .components()
            .map(|c| {
                let mut def = ComponentDef::new(c.name(), c.model_type());
                def.is_enabled = c.meta().enabled;
                for key in c.attribute_keys() {
                    if let Some(value) = c.attribute(key) {
                        def.attributes.insert(key.to_string(), value);
                    }
                }
                def
            })
            .collect();
        model
    }
}
