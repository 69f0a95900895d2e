//! Finite State Projection: a sink-enabled CME solver on a truncated
//! domain, restore points for rollback, pluggable domain expansion
//! strategies, and the adaptive checkpoint/expand/retry controller.

pub mod cme;
pub mod expander;
pub mod restore;
pub mod solver;

pub use cme::{CmeOptions, CmeSolver};
pub use expander::{
    grow_domain, DomainExpander, ExpansionContext, FullBoundaryExpander, SupportExpander,
};
pub use restore::{RestorableSolver, RestorePoint};
pub use solver::FspSolver;
