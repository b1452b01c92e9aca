//! Dense square matrices for pairwise document scores.

use crate::error::{Error, Result};

/// Row-major `n × n` matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    /// An `n × n` matrix of zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build a matrix from rows, checking that it is square.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { n, data })
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for the `0 × 0` matrix.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Entry at row `i`, column `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set the entry at row `i`, column `j`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks` panics on a zero chunk size.
        self.data.chunks(self.n.max(1))
    }

    /// Apply `f` to every entry.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            n: self.n,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Complete a lower-triangular matrix (diagonal included) into a
    /// symmetric one: `M + Mᵀ − diag(M)`.
    pub fn symmetrize_lower(&self) -> Self {
        let mut out = Self::zeros(self.n);
        for i in 0..self.n {
            for j in 0..self.n {
                let mut v = self.get(i, j) + self.get(j, i);
                if i == j {
                    v -= self.get(i, i);
                }
                out.set(i, j, v);
            }
        }
        out
    }

    /// True if `get(i, j) == get(j, i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = SquareMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            err,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn symmetrize_lower_mirrors_and_keeps_diagonal() {
        let m = SquareMatrix::from_rows(&[
            vec![1.0, 0.0, 0.0],
            vec![0.3, 1.0, 0.0],
            vec![0.5, 0.7, 1.0],
        ])
        .unwrap();
        let s = m.symmetrize_lower();
        assert!(s.is_symmetric());
        assert_eq!(s.get(0, 2), 0.5);
        assert_eq!(s.get(1, 2), 0.7);
        for i in 0..3 {
            assert_eq!(s.get(i, i), 1.0);
        }
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let m = SquareMatrix::zeros(0);
        assert!(m.is_empty());
        assert_eq!(m.rows().count(), 0);
    }
}
