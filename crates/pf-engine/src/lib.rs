//! pf-engine: builds a model definition into a running simulation.
//!
//! The [`Engine`] owns every component in a flat arena, in declaration
//! order. Building is two-phase: every component is constructed first, then
//! each is initialized (attributes merged, name references resolved), so a
//! component may reference one declared after it. Each [`Engine::tick`]
//! steps every enabled, initialized component once, in that same order.

pub mod engine;
pub mod error;
pub mod factory;
pub mod observer;

pub use engine::{Engine, EngineOptions, PropertyValue, TickOutcome};
pub use error::{EngineError, EngineResult};
pub use factory::{Constructor, ModelFactory};
pub use observer::{DataCollector, NullObserver, Sample, TickObserver};
pub use pf_components::VolumeGuard;
