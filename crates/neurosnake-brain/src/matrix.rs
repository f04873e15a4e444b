//! Dense row-major matrices of `f64`.

use std::ops::{Index, IndexMut};

/// A `rows × cols` matrix stored in one flat row-major buffer.
///
/// # Example
///
/// ```
/// use neurosnake_brain::matrix::Matrix;
///
/// let mut m = Matrix::zeros(2, 3);
/// m[(1, 2)] = 4.0;
/// assert_eq!(m.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.0, 4.0]);
///
/// let mut out = [0.0; 3];
/// m.mul_add_vec(&[1.0, 0.5], 1.0, &mut out);
/// assert_eq!(out, [1.0, 1.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from nested rows.
    ///
    /// Returns `None` unless there are exactly `rows` rows of exactly `cols`
    /// values each.
    #[must_use]
    pub fn from_nested(nested: &[Vec<f64>], rows: usize, cols: usize) -> Option<Self> {
        if nested.len() != rows || nested.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Self {
            rows,
            cols,
            values: nested.concat(),
        })
    }

    #[must_use]
    pub fn to_nested(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![vec![]; self.rows];
        }
        self.values.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Computes `output = input · self + bias` for a row vector `input`.
    ///
    /// Each output column is accumulated over the input in order, starting
    /// from zero, and the bias is added last.
    ///
    /// # Panics
    ///
    /// Panics if `input.len() != rows` or `output.len() != cols`.
    pub fn mul_add_vec(&self, input: &[f64], bias: f64, output: &mut [f64]) {
        assert_eq!(input.len(), self.rows, "input length must match rows");
        assert_eq!(output.len(), self.cols, "output length must match cols");

        output.fill(0.0);
        for (x, row) in input.iter().zip(self.values.chunks_exact(self.cols.max(1))) {
            for (out, w) in output.iter_mut().zip(row) {
                *out += x * w;
            }
        }
        for out in output {
            *out += bias;
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of range");
        &self.values[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(row < self.rows && col < self.cols, "({row}, {col}) out of range");
        &mut self.values[row * self.cols + col]
    }
}
