//! Constraint Programming (CP) layer.
//!
//! Provides a small finite-domain model for assignment-style problems and
//! a complete backtracking solver for it.
//!
//! # Key Components
//!
//! - **Variables**: [`IntVar`] — bounded integer decision variables
//! - **Constraints**: [`Constraint`] — AllDifferent, Equal, NotEqual, Fixed
//! - **Model**: [`CpModel`] — container for variables and constraints
//! - **Solver**: [`CpSolver`] trait and [`BacktrackingSolver`]
//!
//! # Design
//!
//! Models carry no objective; solvers return the first feasible
//! assignment. The [`CpSolver`] trait allows plugging in an external
//! engine instead of the built-in search.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod model;
mod solver;
mod variables;

pub use model::{Constraint, CpModel};
pub use solver::{BacktrackingSolver, CpSolution, CpSolver, SolverConfig, SolverStatus};
pub use variables::IntVar;
