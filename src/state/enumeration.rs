//! Stable enumeration of a growing state domain.
//!
//! A `StateEnum` maintains a bijection between the `n` states of its
//! domain and the index range `[offset, offset + n)`. The domain only
//! grows; extending it never renumbers a previously assigned index,
//! which is what lets flux matrices built on a smaller enumeration
//! remain valid as the leading sub-block of a larger one.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::state::{Distribution, LexicalSet, State};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEnum {
    dim: usize,
    /// States in assigned-index order; index `i` maps to `states[i]`.
    states: Vec<State>,
    /// Assigned indices permuted into lexicographic order of their states.
    order: Vec<usize>,
    offset: usize,
}

impl StateEnum {
    /// Enumerate `initial` with indices `0..n-1` in sorted order.
    pub fn new(initial: &LexicalSet) -> Self {
        let mut domain_enum = Self {
            dim: initial.dim(),
            states: Vec::new(),
            order: Vec::new(),
            offset: 0,
        };
        domain_enum.reinitialise(initial);
        domain_enum
    }

    /// Discard the current enumeration and start over from `initial`.
    pub fn reinitialise(&mut self, initial: &LexicalSet) {
        self.dim = initial.dim();
        self.states = initial.states().to_vec();
        self.order = (0..self.states.len()).collect();
        self.offset = 0;
    }

    /// Add the disjoint batch `sigma` to the enumeration. New states are
    /// numbered from the current size; existing indices are unchanged.
    pub fn extend(&mut self, sigma: &LexicalSet) {
        assert_eq!(sigma.dim(), self.dim, "state dimension mismatch");
        for state in sigma.iter() {
            assert!(
                self.position(state).is_none(),
                "extend batch must be disjoint from the enumerated domain: {state:?}"
            );
        }
        self.states.extend(sigma.iter().cloned());
        self.order = (0..self.states.len()).collect();
        let states = &self.states;
        self.order.sort_by(|&a, &b| states[a].cmp(&states[b]));
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The enumerated states in lexicographic order.
    pub fn ordered_states(&self) -> Vec<State> {
        self.order.iter().map(|&i| self.states[i].clone()).collect()
    }

    /// The domain as a canonical set.
    pub fn domain(&self) -> LexicalSet {
        LexicalSet::from_states(self.dim, self.states.clone())
    }

    fn position(&self, state: &[i32]) -> Option<usize> {
        let states = &self.states;
        self.order
            .binary_search_by(|&i| states[i].as_slice().cmp(state))
            .ok()
            .map(|k| self.order[k])
    }

    /// Enumeration indices of `queries`, which may be non-unique and
    /// unordered. Looking up a state outside the domain panics; callers
    /// pre-filter with [`contains`](Self::contains).
    pub fn indices(&self, queries: &[State]) -> Vec<usize> {
        queries
            .iter()
            .map(|q| {
                self.position(q)
                    .unwrap_or_else(|| panic!("state {q:?} is not in the enumerated domain"))
                    + self.offset
            })
            .collect()
    }

    /// Batch membership mask over `queries`.
    pub fn contains(&self, queries: &[State]) -> Vec<bool> {
        queries.iter().map(|q| self.position(q).is_some()).collect()
    }

    /// Inverse lookup: states corresponding to enumeration `indices`.
    pub fn states(&self, indices: &[usize]) -> Vec<State> {
        indices
            .iter()
            .map(|&i| self.states[i - self.offset].clone())
            .collect()
    }

    /// Translate a sparse distribution into a dense vector keyed by this
    /// enumeration. Every support state must be in the domain.
    pub fn pack_distribution(&self, p: &Distribution) -> DVector<f64> {
        let mut dense = DVector::zeros(self.size());
        for (state, value) in p.iter() {
            let index = self
                .position(state)
                .unwrap_or_else(|| panic!("state {state:?} is not in the enumerated domain"));
            dense[index] = value;
        }
        dense
    }

    /// Translate a dense vector back into a sparse distribution,
    /// skipping exact-zero entries.
    pub fn unpack_distribution(&self, dense: &DVector<f64>) -> Distribution {
        assert_eq!(dense.len(), self.size(), "dense vector length mismatch");
        let mut p = Distribution::new();
        for (i, &value) in dense.iter().enumerate() {
            if value != 0.0 {
                p.insert(self.states[i].clone(), value);
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice() -> LexicalSet {
        LexicalSet::from_states(
            2,
            vec![vec![1, 0], vec![0, 0], vec![0, 1], vec![2, 2]],
        )
    }

    #[test]
    fn test_initial_indices_follow_sorted_order() {
        let domain_enum = StateEnum::new(&lattice());
        assert_eq!(domain_enum.size(), 4);
        assert_eq!(
            domain_enum.indices(&[vec![0, 0], vec![0, 1], vec![1, 0], vec![2, 2]]),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_extend_preserves_existing_indices() {
        let mut domain_enum = StateEnum::new(&lattice());
        let before = domain_enum.indices(&domain_enum.ordered_states());

        let sigma = LexicalSet::from_states(2, vec![vec![0, 2], vec![-1, 0]]);
        domain_enum.extend(&sigma);

        assert_eq!(domain_enum.size(), 6);
        // all previously assigned indices are untouched
        let ordered_before: Vec<State> =
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![2, 2]];
        assert_eq!(domain_enum.indices(&ordered_before), before);
        // new states continue numbering from the old size, assigned in
        // the batch's sorted order
        assert_eq!(domain_enum.indices(&[vec![-1, 0], vec![0, 2]]), vec![4, 5]);
    }

    #[test]
    fn test_contains_tolerates_duplicates() {
        let domain_enum = StateEnum::new(&lattice());
        let queries = vec![vec![0, 0], vec![9, 9], vec![0, 0]];
        assert_eq!(domain_enum.contains(&queries), vec![true, false, true]);
    }

    #[test]
    fn test_states_inverse_of_indices() {
        let domain_enum = StateEnum::new(&lattice());
        let queries = vec![vec![2, 2], vec![0, 1]];
        let indices = domain_enum.indices(&queries);
        assert_eq!(domain_enum.states(&indices), queries);
    }

    #[test]
    #[should_panic(expected = "disjoint")]
    fn test_extend_rejects_overlap() {
        let mut domain_enum = StateEnum::new(&lattice());
        domain_enum.extend(&LexicalSet::from_states(2, vec![vec![0, 0]]));
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let domain_enum = StateEnum::new(&lattice());
        let p = Distribution::from_pairs(vec![(vec![0, 1], 0.25), (vec![2, 2], 0.75)]);
        let dense = domain_enum.pack_distribution(&p);
        assert_eq!(dense.len(), 4);
        assert_eq!(domain_enum.unpack_distribution(&dense), p);
    }

    #[test]
    fn test_pack_empty_distribution() {
        let domain_enum = StateEnum::new(&lattice());
        let dense = domain_enum.pack_distribution(&Distribution::new());
        assert_eq!(dense.len(), 4);
        assert!(dense.iter().all(|&v| v == 0.0));
    }
}
