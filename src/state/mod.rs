//! State-space primitives: lexicographic set algebra, stable state
//! enumeration, and sparse probability distributions.

pub mod distribution;
pub mod enumeration;
pub mod lexset;

pub use distribution::Distribution;
pub use enumeration::StateEnum;
pub use lexset::LexicalSet;

/// A state of the reaction network: one integer count per species.
pub type State = Vec<i32>;
