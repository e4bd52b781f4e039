//! Component storage and per-tick context.

use pf_core::CompId;

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{Capacitive, Component};

/// What to do when a compartment ends a tick with negative volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeGuard {
    /// Fail the tick with a negative-volume error.
    #[default]
    Abort,
    /// Clamp to zero and log a warning.
    Clamp,
}

/// Flat, stably indexed component arena.
///
/// The component being stepped is taken out of its slot for the duration of
/// its `calc`, so it can borrow its neighbours mutably through the context.
#[derive(Debug, Default)]
pub struct ComponentSlots {
    slots: Vec<Option<Box<dyn Component>>>,
}

impl ComponentSlots {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, component: Box<dyn Component>) -> ComponentResult<CompId> {
        let id = CompId::from_usize(self.slots.len()).ok_or(ComponentError::NonPhysical {
            what: "component count exceeds id range",
        })?;
        self.slots.push(Some(component));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check a component out of its slot.
    pub fn take(&mut self, id: CompId) -> Option<Box<dyn Component>> {
        self.slots.get_mut(id.slot()).and_then(Option::take)
    }

    /// Return a component taken with [`ComponentSlots::take`].
    pub fn restore(&mut self, id: CompId, component: Box<dyn Component>) {
        if let Some(slot) = self.slots.get_mut(id.slot()) {
            *slot = Some(component);
        }
    }

    pub fn get(&self, id: CompId) -> Option<&dyn Component> {
        match self.slots.get(id.slot()) {
            Some(Some(c)) => {
                let c: &dyn Component = c.as_ref();
                Some(c)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: CompId) -> Option<&mut dyn Component> {
        match self.slots.get_mut(id.slot()) {
            Some(Some(c)) => {
                let c: &mut dyn Component = c.as_mut();
                Some(c)
            }
            _ => None,
        }
    }

    /// Components in slot order; checked-out slots are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (CompId, &dyn Component)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let id = CompId::from_usize(i)?;
            let c: &dyn Component = slot.as_deref()?;
            Some((id, c))
        })
    }
}

/// Everything a component sees while it is being stepped.
pub struct TickContext<'a> {
    /// Time step (s)
    pub dt: f64,
    /// Simulated time at the start of this tick (s)
    pub time: f64,
    pub guard: VolumeGuard,
    slots: &'a mut ComponentSlots,
}

impl<'a> TickContext<'a> {
    pub fn new(dt: f64, time: f64, guard: VolumeGuard, slots: &'a mut ComponentSlots) -> Self {
        Self {
            dt,
            time,
            guard,
            slots,
        }
    }

    pub fn capacitive(&self, id: CompId) -> ComponentResult<&dyn Capacitive> {
        self.slots
            .get(id)
            .and_then(|c| c.as_capacitive())
            .ok_or(ComponentError::Unavailable { target: id })
    }

    pub fn capacitive_mut(&mut self, id: CompId) -> ComponentResult<&mut dyn Capacitive> {
        self.slots
            .get_mut(id)
            .and_then(|c| c.as_capacitive_mut())
            .ok_or(ComponentError::Unavailable { target: id })
    }
}
