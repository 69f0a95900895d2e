//! Square sparse matrix in compressed row storage.
//!
//! Built from coordinate triplets: duplicates are summed and explicit
//! zeros eliminated during compaction, so matrices assembled from
//! overlapping flux contributions come out deduplicated.

use nalgebra::DVector;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    size: usize,
    row_ptr: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// The `size x size` zero matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            row_ptr: vec![0; size + 1],
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Compact `(row, col, value)` triplets into row storage. Triplets
    /// sharing a position are summed; entries summing to zero are dropped.
    pub fn from_triplets(size: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        for &(row, col, _) in &triplets {
            assert!(row < size && col < size, "triplet out of bounds");
        }
        triplets.sort_by_key(|&(row, col, _)| (row, col));

        let mut cols = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        let mut rows = Vec::with_capacity(triplets.len());
        for (row, col, value) in triplets {
            if let (Some(&last_row), Some(&last_col)) = (rows.last(), cols.last()) {
                if last_row == row && last_col == col {
                    *values.last_mut().unwrap() += value;
                    continue;
                }
            }
            rows.push(row);
            cols.push(col);
            values.push(value);
        }

        // eliminate entries that cancelled to exactly zero
        let mut keep = 0;
        for k in 0..values.len() {
            if values[k] != 0.0 {
                rows[keep] = rows[k];
                cols[keep] = cols[k];
                values[keep] = values[k];
                keep += 1;
            }
        }
        rows.truncate(keep);
        cols.truncate(keep);
        values.truncate(keep);

        let mut row_ptr = vec![0; size + 1];
        for &row in &rows {
            row_ptr[row + 1] += 1;
        }
        for i in 0..size {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self { size, row_ptr, cols, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `out += scale * (self * v)`
    pub fn accumulate_mul(&self, v: &DVector<f64>, scale: f64, out: &mut DVector<f64>) {
        assert_eq!(v.len(), self.size, "vector length mismatch");
        assert_eq!(out.len(), self.size, "vector length mismatch");
        for row in 0..self.size {
            let mut acc = 0.0;
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                acc += self.values[k] * v[self.cols[k]];
            }
            out[row] += scale * acc;
        }
    }

    /// `self * v`
    pub fn mul_vec(&self, v: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.size);
        self.accumulate_mul(v, 1.0, &mut out);
        out
    }

    /// Entrywise sum of two matrices of equal size.
    pub fn add(&self, rhs: &Self) -> Self {
        assert_eq!(self.size, rhs.size, "matrix size mismatch");
        let mut triplets: Vec<(usize, usize, f64)> = self.triplets().collect();
        triplets.extend(rhs.triplets());
        Self::from_triplets(self.size, triplets)
    }

    /// Iterate over stored `(row, col, value)` entries.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.size).flat_map(move |row| {
            (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(move |k| (row, self.cols[k], self.values[k]))
        })
    }

    /// Sum of each column, for flux-conservation checks.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.size];
        for (_, col, value) in self.triplets() {
            sums[col] += value;
        }
        sums
    }
}
