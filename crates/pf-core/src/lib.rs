//! pf-core: stable foundation for physioflow.
//!
//! Contains:
//! - units (uom SI types + physiological constructors)
//! - numeric (Real, finiteness checks, factor composition)
//! - ids (stable compact IDs for registry slots)
//! - attr (dynamically typed component attribute values)
//! - error (shared error types)
//! - timing (opt-in wall clock measurement)

pub mod attr;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use attr::AttrValue;
pub use error::{PfError, PfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
