//! Lexicographically ordered sets of integer state tuples.
//!
//! The canonical representation keeps states sorted in strictly increasing
//! lexicographic order with no duplicates, so membership is a binary search
//! and the binary set operations are linear merges. The API is batch
//! oriented: membership queries take and return whole slices.

use serde::{Deserialize, Serialize};

use crate::state::State;

/// A canonicalized, duplicate-free, lexicographically sorted set of states.
///
/// All operands of a binary operation must share the same dimension;
/// mismatched dimensions are a programming error and panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalSet {
    dim: usize,
    states: Vec<State>,
}

impl LexicalSet {
    /// The empty set of the given dimension.
    pub fn empty(dim: usize) -> Self {
        Self { dim, states: Vec::new() }
    }

    /// Canonicalize an arbitrary batch of states: sort lexicographically,
    /// keep the first of each duplicate run.
    pub fn from_states(dim: usize, mut states: Vec<State>) -> Self {
        for state in &states {
            assert_eq!(state.len(), dim, "state dimension mismatch");
        }
        states.sort();
        states.dedup();
        Self { dim, states }
    }

    /// The rectangular lattice `{0..shape[0]} x .. x {0..shape[d-1]}`
    /// (upper bounds exclusive), already in canonical order.
    pub fn from_rect(shape: &[i32]) -> Self {
        let dim = shape.len();
        assert!(shape.iter().all(|&n| n >= 0), "negative lattice shape");
        let size: usize = shape.iter().map(|&n| n as usize).product();
        let mut states = Vec::with_capacity(size);
        let mut current = vec![0i32; dim];
        if size > 0 {
            loop {
                states.push(current.clone());
                // odometer increment, last coordinate varies fastest
                let mut axis = dim;
                loop {
                    if axis == 0 {
                        return Self { dim, states };
                    }
                    axis -= 1;
                    current[axis] += 1;
                    if current[axis] < shape[axis] {
                        break;
                    }
                    current[axis] = 0;
                }
            }
        }
        Self { dim, states }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The canonical state slice, in increasing lexicographic order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }

    pub fn contains(&self, state: &[i32]) -> bool {
        assert_eq!(state.len(), self.dim, "state dimension mismatch");
        self.states.binary_search_by(|s| s.as_slice().cmp(state)).is_ok()
    }

    /// Batch membership: `mask[i]` is true iff `queries[i]` is in the set.
    /// Queries may be non-unique and arbitrarily ordered.
    pub fn member(&self, queries: &[State]) -> Vec<bool> {
        queries.iter().map(|q| self.contains(q)).collect()
    }

    /// Union of two sets, by linear merge.
    pub fn union(&self, rhs: &Self) -> Self {
        self.check_dim(rhs);
        let mut merged = Vec::with_capacity(self.len() + rhs.len());
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < rhs.len() {
            match self.states[i].cmp(&rhs.states[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(self.states[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(rhs.states[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(self.states[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.states[i..]);
        merged.extend_from_slice(&rhs.states[j..]);
        Self { dim: self.dim, states: merged }
    }

    /// Intersection of two sets.
    pub fn intersection(&self, rhs: &Self) -> Self {
        self.check_dim(rhs);
        let states = self
            .states
            .iter()
            .filter(|s| rhs.contains(s))
            .cloned()
            .collect();
        Self { dim: self.dim, states }
    }

    /// Set difference `self \ rhs`.
    pub fn difference(&self, rhs: &Self) -> Self {
        self.check_dim(rhs);
        let states = self
            .states
            .iter()
            .filter(|s| !rhs.contains(s))
            .cloned()
            .collect();
        Self { dim: self.dim, states }
    }

    /// One-pass partition: `(self ∩ rhs, self \ rhs)`.
    pub fn split(&self, rhs: &Self) -> (Self, Self) {
        self.check_dim(rhs);
        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for state in &self.states {
            if rhs.contains(state) {
                inside.push(state.clone());
            } else {
                outside.push(state.clone());
            }
        }
        (
            Self { dim: self.dim, states: inside },
            Self { dim: self.dim, states: outside },
        )
    }

    /// Add a constant offset vector to every state.
    pub fn shift(&self, offset: &[i32]) -> Self {
        assert_eq!(offset.len(), self.dim, "offset dimension mismatch");
        // adding a constant preserves lexicographic order
        let states = self
            .states
            .iter()
            .map(|s| s.iter().zip(offset).map(|(a, b)| a + b).collect())
            .collect();
        Self { dim: self.dim, states }
    }

    /// Keep only the states accepted by `test`.
    pub fn filter(&self, test: impl Fn(&[i32]) -> bool) -> Self {
        let states = self
            .states
            .iter()
            .filter(|s| test(s))
            .cloned()
            .collect();
        Self { dim: self.dim, states }
    }

    fn check_dim(&self, rhs: &Self) {
        assert_eq!(self.dim, rhs.dim, "set dimension mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(states: &[&[i32]]) -> LexicalSet {
        let dim = states.first().map_or(2, |s| s.len());
        LexicalSet::from_states(dim, states.iter().map(|s| s.to_vec()).collect())
    }

    #[test]
    fn test_canonicalizes_unordered_duplicates() {
        let a = set(&[&[2, 2], &[0, 0], &[2, 2], &[1, 1], &[0, 0]]);
        assert_eq!(a.states(), &[vec![0, 0], vec![1, 1], vec![2, 2]]);
    }

    #[test]
    fn test_scenario_algebra() {
        let a = set(&[&[0, 0], &[1, 1], &[2, 2]]);
        let b = set(&[&[1, 1], &[3, 3]]);

        assert_eq!(a.intersection(&b).states(), &[vec![1, 1]]);
        assert_eq!(a.difference(&b).states(), &[vec![0, 0], vec![2, 2]]);
        assert_eq!(
            a.union(&b).states(),
            &[vec![0, 0], vec![1, 1], vec![2, 2], vec![3, 3]]
        );

        let (inside, outside) = a.split(&b);
        assert_eq!(inside, a.intersection(&b));
        assert_eq!(outside, a.difference(&b));
    }

    #[test]
    fn test_inclusion_exclusion() {
        let a = set(&[&[0, 1], &[2, 3], &[4, 5], &[6, 7]]);
        let b = set(&[&[2, 3], &[6, 7], &[8, 9]]);
        assert_eq!(
            a.union(&b).len(),
            a.len() + b.len() - a.intersection(&b).len()
        );
        assert_eq!(a.difference(&b).union(&a.intersection(&b)), a);
    }

    #[test]
    fn test_empty_operands() {
        let a = set(&[&[0, 0], &[1, 2]]);
        let empty = LexicalSet::empty(2);

        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
        assert_eq!(a.intersection(&empty), empty);
        assert_eq!(a.difference(&empty), a);
        assert_eq!(empty.difference(&a), empty);
        assert_eq!(empty.member(&[]), Vec::<bool>::new());
    }

    #[test]
    fn test_member_mask() {
        let a = set(&[&[0, 0], &[1, 1]]);
        let queries = vec![vec![1, 1], vec![5, 5], vec![1, 1], vec![0, 0]];
        assert_eq!(a.member(&queries), vec![true, false, true, true]);
    }

    #[test]
    fn test_shift() {
        let a = set(&[&[0, 0], &[1, 2]]);
        let shifted = a.shift(&[1, -1]);
        assert_eq!(shifted.states(), &[vec![1, -1], vec![2, 1]]);
    }

    #[test]
    fn test_from_rect() {
        let lattice = LexicalSet::from_rect(&[2, 3]);
        assert_eq!(lattice.len(), 6);
        assert!(lattice.contains(&[1, 2]));
        assert!(!lattice.contains(&[2, 0]));
        assert_eq!(LexicalSet::from_rect(&[3, 0]).len(), 0);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_dimension_mismatch_panics() {
        let a = set(&[&[0, 0]]);
        let b = LexicalSet::from_states(3, vec![vec![0, 0, 0]]);
        let _ = a.union(&b);
    }

    #[test]
    fn test_randomized_against_reference() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        use std::collections::BTreeSet;

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let draw = |rng: &mut StdRng| -> Vec<State> {
                (0..rng.gen_range(0..30))
                    .map(|_| vec![rng.gen_range(0..5), rng.gen_range(0..5)])
                    .collect()
            };
            let xs = draw(&mut rng);
            let ys = draw(&mut rng);
            let a = LexicalSet::from_states(2, xs.clone());
            let b = LexicalSet::from_states(2, ys.clone());
            let ra: BTreeSet<State> = xs.into_iter().collect();
            let rb: BTreeSet<State> = ys.into_iter().collect();

            let union: Vec<State> = ra.union(&rb).cloned().collect();
            let isect: Vec<State> = ra.intersection(&rb).cloned().collect();
            let diff: Vec<State> = ra.difference(&rb).cloned().collect();
            assert_eq!(a.union(&b).states(), union.as_slice());
            assert_eq!(a.intersection(&b).states(), isect.as_slice());
            assert_eq!(a.difference(&b).states(), diff.as_slice());
        }
    }
}
