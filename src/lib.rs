//! fsp-core — Finite State Projection for the Chemical Master Equation
//!
//! Solves the CME — a linear ODE over a probability distribution on the
//! discrete state space of a reaction network — on a finite truncated
//! domain, accumulating escaped probability in a sink state and growing
//! the domain on demand to keep that truncation error under a
//! caller-supplied bound.

pub mod error;
pub mod fsp;
pub mod matrix;
pub mod model;
pub mod ode;
pub mod state;

pub use error::{Error, Result};
pub use fsp::{
    CmeOptions, CmeSolver, FspSolver, FullBoundaryExpander, RestorableSolver, SupportExpander,
};
pub use matrix::{CmeOperator, SparseMatrix, TimeDependency};
pub use model::{Model, Reaction};
pub use ode::{AdaptiveRk, Integrator, OdeSolver};
pub use state::{Distribution, LexicalSet, State, StateEnum};
