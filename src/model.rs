//! Reaction network model data.
//!
//! A model is an ordered sequence of reactions, each pairing a propensity
//! function with a fixed integer transition vector, plus the initial state
//! of the system. Validation runs eagerly when a solver is constructed.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::state::State;

/// Propensity function: instantaneous reaction rate as a function of state.
///
/// Evaluated per state; batch evaluation over a domain is done by the flux
/// assembly. A constant closure expresses a state-independent rate.
pub type Propensity = Arc<dyn Fn(&[i32]) -> f64 + Send + Sync>;

/// Time-dependent coefficient `phi(t)` multiplying a group of reactions.
pub type TimeCoefficient = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Validity test over a state, used to filter flux leaving the domain.
pub type ValidityTest = Arc<dyn Fn(&[i32]) -> bool + Send + Sync>;

/// Accepts states with no negative coordinate. The default validity test.
pub fn non_negative_states() -> ValidityTest {
    Arc::new(|state: &[i32]| state.iter().all(|&x| x >= 0))
}

/// Accepts every state; routes all exterior flux to the sink.
pub fn all_states() -> ValidityTest {
    Arc::new(|_: &[i32]| true)
}

/// One reaction: a propensity and the displacement it applies to the state.
#[derive(Clone)]
pub struct Reaction {
    pub propensity: Propensity,
    pub transition: Vec<i32>,
}

impl Reaction {
    pub fn new(propensity: impl Fn(&[i32]) -> f64 + Send + Sync + 'static, transition: Vec<i32>) -> Self {
        Self {
            propensity: Arc::new(propensity),
            transition,
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("transition", &self.transition)
            .finish_non_exhaustive()
    }
}

/// A reaction network: ordered reactions plus the initial state.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub reactions: Vec<Reaction>,
    pub initial_state: State,
}

impl Model {
    pub fn new(name: impl Into<String>, reactions: Vec<Reaction>, initial_state: State) -> Self {
        Self {
            name: name.into(),
            reactions,
            initial_state,
        }
    }

    /// Number of species, i.e. the dimension of every state tuple.
    pub fn dim(&self) -> usize {
        self.initial_state.len()
    }

    /// Transition vectors of all reactions, in reaction order.
    pub fn transitions(&self) -> Vec<Vec<i32>> {
        self.reactions.iter().map(|r| r.transition.clone()).collect()
    }

    /// Eager configuration check: at least one reaction, and every
    /// transition vector must match the state dimension.
    pub fn validate(&self) -> Result<()> {
        if self.reactions.is_empty() {
            return Err(Error::InvalidModel(format!(
                "model '{}' has no reactions",
                self.name
            )));
        }
        let dim = self.dim();
        if dim == 0 {
            return Err(Error::InvalidModel(format!(
                "model '{}' has an empty initial state",
                self.name
            )));
        }
        for (i, reaction) in self.reactions.iter().enumerate() {
            if reaction.transition.len() != dim {
                return Err(Error::InvalidModel(format!(
                    "reaction {} transition has dimension {}, expected {}",
                    i,
                    reaction.transition.len(),
                    dim
                )));
            }
        }
        Ok(())
    }
}
