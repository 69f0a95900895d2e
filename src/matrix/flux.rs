//! Per-reaction flux matrices and the assembled dp/dt operator.
//!
//! For each reaction the domain is partitioned by where its transition
//! sends each state: flux between two domain states stays interior,
//! flux whose destination left the domain is routed to the sink state
//! (when one is requested) provided the destination passes the validity
//! test. Flux to an invalid destination is treated as impossible and
//! discarded, not counted as truncation loss.

use log::debug;

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;
use crate::model::{Model, Propensity, TimeCoefficient, ValidityTest};
use crate::state::{State, StateEnum};

/// Evaluate a propensity over a batch of states, rejecting negative or
/// non-finite rates.
pub fn compute_propensity(
    reaction: usize,
    propensity: &Propensity,
    states: &[State],
) -> Result<Vec<f64>> {
    states
        .iter()
        .map(|state| {
            let value = propensity(state);
            if !value.is_finite() || value < 0.0 {
                return Err(Error::BadPropensity {
                    reaction,
                    value,
                    state: state.clone(),
                });
            }
            Ok(value)
        })
        .collect()
}

/// Build one sparse flux matrix per reaction of `model` over the states
/// enumerated by `domain_enum`, in reaction order.
///
/// With `sink` set, each matrix gains one extra row and column at index
/// `domain_enum.size()` accumulating probability that leaves the domain
/// through a validity-passing destination.
pub fn reaction_matrices(
    model: &Model,
    domain_enum: &StateEnum,
    sink: bool,
    validity: &ValidityTest,
) -> Result<Vec<SparseMatrix>> {
    model.validate()?;
    if domain_enum.offset() != 0 {
        return Err(Error::NonZeroOffset);
    }

    let size = domain_enum.size();
    let sink_index = size;
    let matrix_size = if sink { size + 1 } else { size };

    let src_states = domain_enum.ordered_states();
    let src_indices = domain_enum.indices(&src_states);

    let mut matrices = Vec::with_capacity(model.reactions.len());
    for (r, reaction) in model.reactions.iter().enumerate() {
        let dst_states: Vec<State> = src_states
            .iter()
            .map(|s| {
                s.iter()
                    .zip(&reaction.transition)
                    .map(|(a, b)| a + b)
                    .collect()
            })
            .collect();

        let interior = domain_enum.contains(&dst_states);
        let mut triplets = Vec::new();

        // interior flux: out of the source, into the destination
        let int_src: Vec<State> = src_states
            .iter()
            .zip(&interior)
            .filter(|(_, &inside)| inside)
            .map(|(s, _)| s.clone())
            .collect();
        if !int_src.is_empty() {
            let int_dst: Vec<State> = dst_states
                .iter()
                .zip(&interior)
                .filter(|(_, &inside)| inside)
                .map(|(s, _)| s.clone())
                .collect();
            let int_src_indices: Vec<usize> = src_indices
                .iter()
                .zip(&interior)
                .filter(|(_, &inside)| inside)
                .map(|(&i, _)| i)
                .collect();
            let int_dst_indices = domain_enum.indices(&int_dst);
            let coefficients = compute_propensity(r, &reaction.propensity, &int_src)?;
            for ((&src, &dst), a) in int_src_indices
                .iter()
                .zip(&int_dst_indices)
                .zip(coefficients)
            {
                triplets.push((src, src, -a));
                triplets.push((dst, src, a));
            }
        }

        // exterior flux: out of the domain, into the sink, unless the
        // destination fails the validity test
        if sink {
            let ext_src: Vec<State> = src_states
                .iter()
                .zip(&interior)
                .zip(&dst_states)
                .filter(|((_, &inside), dst)| !inside && validity(dst))
                .map(|((s, _), _)| s.clone())
                .collect();
            if !ext_src.is_empty() {
                let ext_src_indices = domain_enum.indices(&ext_src);
                let coefficients = compute_propensity(r, &reaction.propensity, &ext_src)?;
                for (&src, a) in ext_src_indices.iter().zip(coefficients) {
                    triplets.push((src, src, -a));
                    triplets.push((sink_index, src, a));
                }
            }
        }

        let matrix = SparseMatrix::from_triplets(matrix_size, triplets);
        debug!(
            "reaction {} flux matrix: {} states, {} nonzeros",
            r,
            size,
            matrix.nnz()
        );
        matrices.push(matrix);
    }
    Ok(matrices)
}

/// A time-dependent coefficient applied to a group of reactions:
/// the propensities of all reactions in `reactions` are multiplied by
/// `coefficient(t)`.
#[derive(Clone)]
pub struct TimeDependency {
    pub reactions: Vec<usize>,
    pub coefficient: TimeCoefficient,
}

struct Term {
    matrix: SparseMatrix,
    coefficient: Option<TimeCoefficient>,
}

/// The assembled linear operator `p -> dp/dt(t, p)`.
///
/// Reactions sharing a time dependency are pre-summed into one group
/// matrix; the remaining reactions form a constant group. Coefficients
/// are evaluated fresh on every call.
pub struct CmeOperator {
    size: usize,
    terms: Vec<Term>,
}

impl CmeOperator {
    pub fn new(matrices: Vec<SparseMatrix>, time_dependencies: Vec<TimeDependency>) -> Result<Self> {
        if matrices.is_empty() {
            return Err(Error::NoReactions);
        }
        let size = matrices[0].size();
        for matrix in &matrices {
            if matrix.size() != size {
                return Err(Error::ShapeMismatch(size, matrix.size()));
            }
        }

        let mut constant = vec![true; matrices.len()];
        for dependency in &time_dependencies {
            if dependency.reactions.is_empty() {
                return Err(Error::TimeDependency(
                    "reaction index subsets must be non-empty".into(),
                ));
            }
            for &i in &dependency.reactions {
                if i >= matrices.len() {
                    return Err(Error::TimeDependency(format!(
                        "reaction index {i} out of range"
                    )));
                }
                if !constant[i] {
                    return Err(Error::TimeDependency(format!(
                        "reaction index {i} appears in more than one subset"
                    )));
                }
                constant[i] = false;
            }
        }

        let sum_group = |indices: &[usize]| {
            indices
                .iter()
                .fold(SparseMatrix::zeros(size), |acc, &i| acc.add(&matrices[i]))
        };

        let mut terms = Vec::new();
        for dependency in &time_dependencies {
            terms.push(Term {
                matrix: sum_group(&dependency.reactions),
                coefficient: Some(dependency.coefficient.clone()),
            });
        }
        let const_indices: Vec<usize> = (0..matrices.len()).filter(|&i| constant[i]).collect();
        if !const_indices.is_empty() {
            terms.push(Term {
                matrix: sum_group(&const_indices),
                coefficient: None,
            });
        }

        Ok(Self { size, terms })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// `dp/dt(t, p)`, linear in `p`.
    pub fn eval(&self, t: f64, p: &nalgebra::DVector<f64>) -> nalgebra::DVector<f64> {
        let mut out = nalgebra::DVector::zeros(self.size);
        for term in &self.terms {
            let scale = match &term.coefficient {
                Some(phi) => phi(t),
                None => 1.0,
            };
            term.matrix.accumulate_mul(p, scale, &mut out);
        }
        out
    }
}
