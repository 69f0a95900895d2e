//! Construction of a CME solver over a truncated domain.
//!
//! Wires together the state enumeration, the per-reaction flux matrices,
//! the assembled dp/dt operator, and the packing adapter. The structured
//! solution is the pair `(p, p_sink)`; its packed form is the dense
//! probability vector with the sink probability appended (sink variant)
//! or the dense vector alone.

use log::debug;
use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::matrix::{reaction_matrices, CmeOperator, TimeDependency};
use crate::model::{non_negative_states, Model, ValidityTest};
use crate::ode::{DerivativeForm, OdeSolver, Packing};
use crate::state::{Distribution, LexicalSet, StateEnum};

/// Optional solver configuration.
#[derive(Clone)]
pub struct CmeOptions {
    /// Initial distribution; defaults to unit mass at the model's
    /// initial state.
    pub p_0: Option<Distribution>,
    /// Initial sink probability, nonzero when warm-restarting.
    pub p_sink_0: f64,
    /// Initial time.
    pub t_0: f64,
    /// Time-dependent coefficient groups, disjoint by reaction index.
    pub time_dependencies: Vec<TimeDependency>,
    /// Validity test applied to destinations outside the domain.
    pub validity: ValidityTest,
}

impl Default for CmeOptions {
    fn default() -> Self {
        Self {
            p_0: None,
            p_sink_0: 0.0,
            t_0: 0.0,
            time_dependencies: Vec::new(),
            validity: non_negative_states(),
        }
    }
}

/// A CME solver over a fixed truncated domain.
pub struct CmeSolver {
    domain_enum: StateEnum,
    sink: bool,
    ode: OdeSolver<(Distribution, f64)>,
}

impl CmeSolver {
    pub fn new(
        model: &Model,
        domain: &LexicalSet,
        sink: bool,
        options: &CmeOptions,
    ) -> Result<Self> {
        model.validate()?;

        let domain_enum = StateEnum::new(domain);

        let p_0 = match &options.p_0 {
            Some(p) => p.clone(),
            None => Distribution::point_mass(model.initial_state.clone()),
        };
        if domain_enum.contains(&p_0.support()).iter().any(|&m| !m) {
            return Err(Error::InitialSupport);
        }

        let matrices = reaction_matrices(model, &domain_enum, sink, &options.validity)?;
        let operator = CmeOperator::new(matrices, options.time_dependencies.clone())?;
        debug!(
            "CME solver for '{}': {} states, sink = {}",
            model.name,
            domain_enum.size(),
            sink
        );

        // the operator already acts on packed vectors
        let derivative =
            DerivativeForm::Packed(Box::new(move |t, x: &DVector<f64>| operator.eval(t, x)));

        let mut ode = OdeSolver::new(derivative, (p_0, options.p_sink_0), options.t_0);

        let pack_enum = domain_enum.clone();
        let unpack_enum = domain_enum.clone();
        let packing = if sink {
            Packing {
                pack: Box::new(move |(p, p_sink): &(Distribution, f64)| {
                    let dense = pack_enum.pack_distribution(p);
                    let mut packed = DVector::zeros(dense.len() + 1);
                    packed.rows_mut(0, dense.len()).copy_from(&dense);
                    packed[dense.len()] = *p_sink;
                    packed
                }),
                unpack: Box::new(move |x: &DVector<f64>| {
                    let n = x.len() - 1;
                    let p = unpack_enum.unpack_distribution(&x.rows(0, n).into_owned());
                    (p, x[n])
                }),
            }
        } else {
            Packing {
                pack: Box::new(move |(p, _): &(Distribution, f64)| {
                    pack_enum.pack_distribution(p)
                }),
                unpack: Box::new(move |x: &DVector<f64>| {
                    (unpack_enum.unpack_distribution(x), 0.0)
                }),
            }
        };
        ode.set_packing(packing)?;

        Ok(Self {
            domain_enum,
            sink,
            ode,
        })
    }

    pub fn domain_enum(&self) -> &StateEnum {
        &self.domain_enum
    }

    pub fn sink(&self) -> bool {
        self.sink
    }

    pub fn t(&self) -> f64 {
        self.ode.t()
    }

    /// A copy of the current solution `(p, p_sink)`; `p_sink` is zero
    /// when the solver was built without a sink.
    pub fn y(&self) -> Result<(Distribution, f64)> {
        self.ode.y()
    }

    /// Evaluate dp/dt at `(t, y)` in structured space.
    pub fn dy_dt(&self, t: f64, y: &(Distribution, f64)) -> Result<(Distribution, f64)> {
        self.ode.dy_dt(t, y)
    }

    /// Advance the solution to time `t`.
    pub fn step(&mut self, t: f64) -> Result<()> {
        self.ode.step(t)
    }
}
