//! The adaptive FSP control loop.
//!
//! Each step is a bounded speculative solve: integrate to the target
//! time, compare the sink probability against the cumulative error
//! budget, and on violation expand the domain, roll the solver back to
//! the last accepted checkpoint, and retry. The budget is cumulative
//! across steps; it is the error banked at the restore point plus the
//! epsilon granted for this step.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::fsp::cme::CmeOptions;
use crate::fsp::expander::{DomainExpander, ExpansionContext};
use crate::fsp::restore::RestorableSolver;
use crate::model::Model;
use crate::state::{Distribution, LexicalSet};

/// CME solver that adaptively expands its domain to keep truncation
/// error under the per-step epsilon.
pub struct FspSolver {
    solver: RestorableSolver,
    domain: LexicalSet,
    expander: Box<dyn DomainExpander>,
    max_expansions: Option<usize>,
}

impl FspSolver {
    pub fn new(
        model: Model,
        domain: LexicalSet,
        expander: Box<dyn DomainExpander>,
        options: CmeOptions,
    ) -> Result<Self> {
        let solver = RestorableSolver::new(model, &domain, true, options)?;
        Ok(Self {
            solver,
            domain,
            expander,
            max_expansions: None,
        })
    }

    /// Bound the number of expansion rounds a single `step` may attempt.
    /// Unbounded by default; termination is otherwise the caller's
    /// tuning responsibility.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    /// Advance the solution to time `t`, spending at most `epsilon`
    /// additional truncation error.
    pub fn step(&mut self, t: f64, epsilon: f64) -> Result<()> {
        let budget = self.solver.restore_point_error() + epsilon;
        let mut rounds = 0usize;

        loop {
            self.solver.step(t)?;
            let (p, p_sink) = self.solver.y()?;

            if p_sink <= budget {
                self.solver.set_restore_point()?;
                return Ok(());
            }

            rounds += 1;
            if let Some(max) = self.max_expansions {
                if rounds > max {
                    return Err(Error::Expansion(format!(
                        "exceeded {max} expansion rounds within one step"
                    )));
                }
            }
            warn!(
                "truncation error {p_sink:.3e} exceeds budget {budget:.3e} at t = {t}, expanding"
            );

            let expanded = self.expander.expand(&ExpansionContext {
                domain: &self.domain,
                p: &p,
                p_sink,
                t,
            })?;
            if expanded.len() <= self.domain.len() {
                return Err(Error::Expansion(
                    "expansion did not increase the size of the domain".into(),
                ));
            }
            info!(
                "domain expanded from {} to {} states",
                self.domain.len(),
                expanded.len()
            );
            self.domain = expanded;
            // roll back to the last accepted checkpoint on the new domain
            self.solver.restore(&self.domain)?;
        }
    }

    pub fn t(&self) -> f64 {
        self.solver.t()
    }

    /// A copy of the current solution `(p, p_sink)`.
    pub fn y(&self) -> Result<(Distribution, f64)> {
        self.solver.y()
    }

    pub fn domain(&self) -> &LexicalSet {
        &self.domain
    }
}
