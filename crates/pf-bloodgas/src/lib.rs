//! pf-bloodgas: blood acid-base and oxygenation equilibrium.
//!
//! Two independent scalar problems are solved per blood sample:
//! - **Acid-base**: the hydrogen-ion concentration at which plasma charge
//!   balance (strong ions, carbonic acid system, water, weak acids) is zero.
//! - **Oxygenation**: the O2 partial pressure at which hemoglobin-bound plus
//!   dissolved O2 equals the known total O2 content.
//!
//! Both objectives live on explicit context structs ([`ChargeBalance`],
//! [`OxygenContent`]) captured by the root finder's closure, so every solve
//! is reentrant and batches can be evaluated in parallel ([`solve_batch`]).
//!
//! Units: concentrations in mmol/L, partial pressures in mmHg, temperature
//! in °C, saturation as a fraction in [0, 1].

pub mod acid_base;
pub mod blood_gas;
pub mod composition;
pub mod error;
pub mod oxygenation;

pub use acid_base::{AcidBase, ChargeBalance, base_excess, hp_from_ph, ph_from_hp, solve_acid_base};
pub use blood_gas::{BloodGas, BloodSample, solve_batch, solve_blood_gas};
pub use composition::{BloodContent, Solute, Solutes};
pub use error::{BloodGasError, BloodGasResult};
pub use oxygenation::{OdcParams, OxygenContent, Oxygenation, p50, saturation, solve_oxygenation};
