//! Scalar bracketing root finder for physioflow.
//!
//! The only solver the simulator needs is a robust one-dimensional root
//! finder: both blood-gas equilibria are monotone scalar problems solved
//! every time a compartment's composition snapshot is refreshed. Brent's
//! method gives bisection's guaranteed convergence with superlinear speed.
//!
//! The solver is a pure function of its inputs. Objective functions capture
//! their context in a closure, so independent solves can run on any thread.

pub mod brent;
pub mod error;

pub use brent::{BrentConfig, BrentSolution, brent, solve};
pub use error::{SolverError, SolverResult};
