//! Sparse linear-operator assembly for the CME right-hand side.

pub mod flux;
pub mod sparse;

pub use flux::{reaction_matrices, CmeOperator, TimeDependency};
pub use sparse::SparseMatrix;
