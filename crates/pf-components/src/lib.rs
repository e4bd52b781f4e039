//! pf-components: simulated elements for physioflow.
//!
//! Every element implements [`Component`]: string-keyed attributes for the
//! build spec, a one-time [`Component::resolve`] of name references, and a
//! per-tick [`Component::calc`]. Compartments additionally implement
//! [`Capacitive`], which is the only way connectors touch another element's
//! volume.
//!
//! - [`Capacitance`], [`TimeVaryingElastance`]: elastic compartments
//! - [`BloodCapacitance`], [`BloodTimeVaryingElastance`]: the same with blood
//!   content and blood-gas snapshot
//! - [`Container`]: compartment enclosing others
//! - [`Resistor`], [`Valve`]: pressure-driven connectors
//! - [`Heart`]: cardiac timing controller driving chamber activation
//!
//! # Example
//!
//! ```
//! use pf_components::{Capacitance, Capacitive, ComponentSlots, Component, TickContext, VolumeGuard};
//!
//! let mut c = Capacitance::new("AA").with_volume(0.2).with_elastance(1000.0, 0.0);
//! let mut slots = ComponentSlots::default();
//! let mut ctx = TickContext::new(0.0005, 0.0, VolumeGuard::Abort, &mut slots);
//! c.calc(&mut ctx).unwrap();
//! assert!((c.pressure() - 200.0).abs() < 1e-9);
//! ```

pub mod blood;
pub mod capacitance;
pub mod common;
pub mod container;
pub mod context;
pub mod elastance;
pub mod error;
pub mod factor;
pub mod heart;
pub mod resistor;
pub mod traits;
pub mod valve;

// Re-exports
pub use blood::{Blood, BloodCapacitance, BloodComposition, BloodTimeVaryingElastance, Elastic};
pub use capacitance::{Capacitance, VolumeState};
pub use container::Container;
pub use context::{ComponentSlots, TickContext, VolumeGuard};
pub use elastance::TimeVaryingElastance;
pub use error::{ComponentError, ComponentResult};
pub use factor::Factor;
pub use heart::{CardiacPhase, Heart};
pub use resistor::{Connector, Resistor};
pub use traits::{
    Capacitive, Component, ComponentMeta, NumericWarning, RegistryHandle, StepOutcome, init,
    read_attribute, step, write_attribute,
};
pub use valve::Valve;
