//! ODE integration: a pluggable stiff-integrator seam and the packing
//! adapter the CME solvers are built on.

pub mod adapter;
pub mod stepper;

pub use adapter::{DerivativeForm, OdeSolver, Packing};
pub use stepper::{AdaptiveRk, Integrator};
