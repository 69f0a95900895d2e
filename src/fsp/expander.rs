//! Domain expansion strategies.

use log::debug;

use crate::error::{Error, Result};
use crate::model::{non_negative_states, ValidityTest};
use crate::state::{Distribution, LexicalSet};

/// Everything a strategy may consult when proposing new states.
pub struct ExpansionContext<'a> {
    pub domain: &'a LexicalSet,
    pub p: &'a Distribution,
    pub p_sink: f64,
    pub t: f64,
}

/// A policy proposing an enlarged domain when truncation error exceeds
/// the step budget.
pub trait DomainExpander {
    fn expand(&self, ctx: &ExpansionContext<'_>) -> Result<LexicalSet>;
}

/// Grow `domain` outward along every transition, `depth` times, keeping
/// only states accepted by `validity`.
pub fn grow_domain(
    domain: &LexicalSet,
    transitions: &[Vec<i32>],
    depth: usize,
    validity: &ValidityTest,
) -> Result<LexicalSet> {
    if domain.is_empty() {
        return Err(Error::Expansion(
            "there must be at least one state to expand".into(),
        ));
    }
    let mut frontier = domain.clone();
    let mut expanded = domain.clone();
    for _ in 0..depth {
        for transition in transitions {
            let shifted = frontier.shift(transition).filter(|s| validity(s));
            expanded = expanded.union(&shifted);
        }
        frontier = expanded.clone();
    }
    Ok(expanded)
}

/// Expands the entire domain along the given transitions to a fixed depth.
pub struct FullBoundaryExpander {
    transitions: Vec<Vec<i32>>,
    depth: usize,
    validity: ValidityTest,
}

impl FullBoundaryExpander {
    pub fn new(transitions: Vec<Vec<i32>>, depth: usize) -> Self {
        Self {
            transitions,
            depth,
            validity: non_negative_states(),
        }
    }

    pub fn with_validity(mut self, validity: ValidityTest) -> Self {
        self.validity = validity;
        self
    }
}

impl DomainExpander for FullBoundaryExpander {
    fn expand(&self, ctx: &ExpansionContext<'_>) -> Result<LexicalSet> {
        grow_domain(ctx.domain, &self.transitions, self.depth, &self.validity)
    }
}

/// Expands only around the support of a compressed epsilon-approximation
/// of the current solution, then unions with the existing domain.
pub struct SupportExpander {
    transitions: Vec<Vec<i32>>,
    depth: usize,
    epsilon: f64,
    validity: ValidityTest,
}

impl SupportExpander {
    pub fn new(transitions: Vec<Vec<i32>>, depth: usize, epsilon: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&epsilon),
            "epsilon must satisfy 0.0 <= epsilon <= 1.0"
        );
        Self {
            transitions,
            depth,
            epsilon,
            validity: non_negative_states(),
        }
    }

    pub fn with_validity(mut self, validity: ValidityTest) -> Self {
        self.validity = validity;
        self
    }
}

impl DomainExpander for SupportExpander {
    fn expand(&self, ctx: &ExpansionContext<'_>) -> Result<LexicalSet> {
        let compressed = ctx.p.compress(self.epsilon);
        let support = LexicalSet::from_states(ctx.domain.dim(), compressed.support());
        debug!(
            "support expansion: {} of {} states kept after compression",
            support.len(),
            ctx.domain.len()
        );
        let grown = grow_domain(&support, &self.transitions, self.depth, &self.validity)?;
        Ok(ctx.domain.union(&grown))
    }
}
