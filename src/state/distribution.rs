//! Sparse probability distributions over states.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::state::State;

/// Sparse map from states to probability. This is the boundary format;
/// solvers work on dense vectors keyed by a [`StateEnum`](crate::StateEnum).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    map: HashMap<State, f64>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// All probability mass concentrated at a single state.
    pub fn point_mass(state: State) -> Self {
        let mut map = HashMap::new();
        map.insert(state, 1.0);
        Self { map }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (State, f64)>) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, state: &[i32]) -> f64 {
        self.map.get(state).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, state: State, value: f64) {
        self.map.insert(state, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, f64)> {
        self.map.iter().map(|(s, &v)| (s, v))
    }

    /// The states carrying mass, in no particular order.
    pub fn support(&self) -> Vec<State> {
        self.map.keys().cloned().collect()
    }

    /// Total probability mass.
    pub fn total(&self) -> f64 {
        self.map.values().sum()
    }

    /// Smallest-support approximation within `epsilon` (L1).
    ///
    /// Entries are visited in ascending probability; the largest prefix
    /// whose cumulative mass stays strictly under `epsilon` is dropped.
    pub fn compress(&self, epsilon: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&epsilon),
            "epsilon must satisfy 0.0 <= epsilon <= 1.0"
        );
        let mut entries: Vec<(State, f64)> =
            self.map.iter().map(|(s, &v)| (s.clone(), v)).collect();
        // tie-break on the state so compression is deterministic
        entries.sort_by(|(sa, va), (sb, vb)| {
            va.total_cmp(vb).then_with(|| sa.cmp(sb))
        });
        let mut cumulative = 0.0;
        let mut map = HashMap::new();
        for (state, value) in entries {
            cumulative += value;
            if cumulative >= epsilon {
                map.insert(state, value);
            }
        }
        Self { map }
    }
}

impl FromIterator<(State, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (State, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_mass() {
        let p = Distribution::point_mass(vec![0, 0]);
        assert_eq!(p.get(&[0, 0]), 1.0);
        assert_eq!(p.get(&[1, 0]), 0.0);
        assert!((p.total() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_compress_drops_small_tail() {
        let p = Distribution::from_pairs(vec![
            (vec![0], 0.5),
            (vec![1], 0.3),
            (vec![2], 0.15),
            (vec![3], 0.04),
            (vec![4], 0.01),
        ]);
        // 0.01 + 0.04 = 0.05 < 0.1, but adding 0.15 crosses the threshold
        let compressed = p.compress(0.1);
        assert_eq!(compressed.len(), 3);
        assert_eq!(compressed.get(&[3]), 0.0);
        assert_eq!(compressed.get(&[4]), 0.0);
        assert_eq!(compressed.get(&[2]), 0.15);
    }

    #[test]
    fn test_compress_zero_epsilon_is_identity() {
        let p = Distribution::from_pairs(vec![(vec![0], 0.7), (vec![1], 0.3)]);
        assert_eq!(p.compress(0.0), p);
    }
}
