//! Checkpointing for speculative solves.
//!
//! The restore point is an explicit snapshot value: the solver can be
//! rebuilt from it on a larger domain without losing the time already
//! integrated. This is the rollback half of the FSP retry loop.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fsp::cme::{CmeOptions, CmeSolver};
use crate::model::Model;
use crate::state::{Distribution, LexicalSet};

/// Snapshot sufficient to resume integration after a rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorePoint {
    pub t: f64,
    pub p: Distribution,
    pub p_sink: f64,
}

/// A CME solver that can snapshot its state and be rebuilt from the
/// snapshot, optionally on an enlarged domain.
pub struct RestorableSolver {
    model: Model,
    sink: bool,
    options: CmeOptions,
    solver: CmeSolver,
    restore_point: RestorePoint,
}

impl RestorableSolver {
    pub fn new(
        model: Model,
        domain: &LexicalSet,
        sink: bool,
        options: CmeOptions,
    ) -> Result<Self> {
        let solver = CmeSolver::new(&model, domain, sink, &options)?;
        let (p, p_sink) = solver.y()?;
        let restore_point = RestorePoint {
            t: solver.t(),
            p,
            p_sink,
        };
        Ok(Self {
            model,
            sink,
            options,
            solver,
            restore_point,
        })
    }

    /// Bank the current solver state as the restore point.
    pub fn set_restore_point(&mut self) -> Result<()> {
        let (p, p_sink) = self.solver.y()?;
        self.restore_point = RestorePoint {
            t: self.solver.t(),
            p,
            p_sink,
        };
        Ok(())
    }

    /// Rebuild the solver from the restore point on `domain`. The new
    /// domain must contain the restore point's support; integration
    /// resumes from the checkpointed time, not from a cold start.
    pub fn restore(&mut self, domain: &LexicalSet) -> Result<()> {
        let mut options = self.options.clone();
        options.p_0 = Some(self.restore_point.p.clone());
        options.p_sink_0 = self.restore_point.p_sink;
        options.t_0 = self.restore_point.t;
        self.solver = CmeSolver::new(&self.model, domain, self.sink, &options)?;
        Ok(())
    }

    /// Truncation error already banked at the restore point.
    pub fn restore_point_error(&self) -> f64 {
        assert!(
            self.sink,
            "restore point error is only tracked for sink-enabled solvers"
        );
        self.restore_point.p_sink
    }

    pub fn restore_point(&self) -> &RestorePoint {
        &self.restore_point
    }

    pub fn t(&self) -> f64 {
        self.solver.t()
    }

    pub fn y(&self) -> Result<(Distribution, f64)> {
        self.solver.y()
    }

    pub fn step(&mut self, t: f64) -> Result<()> {
        self.solver.step(t)
    }
}
