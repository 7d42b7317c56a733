// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

const PIVOT_TOLERANCE: f64 = 1e-10;

/// Dense row-major matrix of `f64`.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Wrap row-major `data`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::DimensionMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Stack equally long vectors as the columns of a matrix.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        let mut m = Self::zeros(rows, columns.len());
        for (j, column) in columns.iter().enumerate() {
            m.set_column(j, column)?;
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self[(i, j)]).collect()
    }

    pub fn set_column(&mut self, j: usize, values: &[f64]) -> Result<()> {
        if values.len() != self.rows {
            return Err(Error::DimensionMismatch {
                expected: self.rows,
                actual: values.len(),
            });
        }
        for (i, &v) in values.iter().enumerate() {
            self[(i, j)] = v;
        }
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                actual: other.rows,
            });
        }
        let mut product = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    product.data[i * other.cols + j] += a * other[(k, j)];
                }
            }
        }
        Ok(product)
    }

    /// `self * v`.
    pub fn mul_vector(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                actual: v.len(),
            });
        }
        Ok((0..self.rows)
            .map(|i| self.row(i).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// `selfᵀ * v`, without materializing the transpose.
    pub fn transpose_mul_vector(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.rows {
            return Err(Error::DimensionMismatch {
                expected: self.rows,
                actual: v.len(),
            });
        }
        let mut out = vec![0.0; self.cols];
        for (i, &vi) in v.iter().enumerate() {
            for (o, &a) in out.iter_mut().zip(self.row(i)) {
                *o += a * vi;
            }
        }
        Ok(out)
    }

    /// Gauss-Jordan inverse with partial pivoting.
    pub fn inverse(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(Error::DimensionMismatch {
                expected: self.rows,
                actual: self.cols,
            });
        }
        let n = self.rows;
        let mut a = self.clone();
        let mut inv = Matrix::identity(n);

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&r1, &r2| a[(r1, col)].abs().total_cmp(&a[(r2, col)].abs()))
                .unwrap_or(col);
            let pivot = a[(pivot_row, col)];
            if pivot.abs() < PIVOT_TOLERANCE {
                return Err(Error::SingularMatrix { pivot });
            }
            if pivot_row != col {
                a.swap_rows(pivot_row, col);
                inv.swap_rows(pivot_row, col);
            }

            for j in 0..n {
                a[(col, j)] /= pivot;
                inv[(col, j)] /= pivot;
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[(r, col)];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[(r, j)] -= factor * a[(col, j)];
                    inv[(r, j)] -= factor * inv[(col, j)];
                }
            }
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        for j in 0..self.cols {
            self.data.swap(r1 * self.cols + j, r2 * self.cols + j);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix, b: &Matrix, eps: f64) {
        assert_eq!((a.rows(), a.cols()), (b.rows(), b.cols()));
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < eps, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_multiply() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let c = a.multiply(&b).unwrap();
        assert_eq!(vec![58.0, 64.0, 139.0, 154.0], c.as_slice().to_vec());
        assert!(matches!(a.multiply(&a), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_transpose_and_columns() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = a.transpose();
        assert_eq!(3, t.rows());
        assert_eq!(vec![1.0, 4.0], t.row(0).to_vec());
        assert_eq!(vec![3.0, 6.0], a.column(2));

        let rebuilt = Matrix::from_columns(&[a.column(0), a.column(1), a.column(2)]).unwrap();
        assert_eq!(a, rebuilt);
    }

    #[test]
    fn test_vector_products() {
        let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(vec![14.0, 32.0], a.mul_vector(&[1.0, 2.0, 3.0]).unwrap());
        assert_eq!(
            a.transpose().mul_vector(&[1.0, -1.0]).unwrap(),
            a.transpose_mul_vector(&[1.0, -1.0]).unwrap()
        );
        assert!(a.mul_vector(&[1.0]).is_err());
    }

    #[test]
    fn test_inverse() {
        let a = Matrix::from_vec(3, 3, vec![0.0, 2.0, 1.0, 1.0, 1.0, 0.0, 3.0, 0.0, 4.0]).unwrap();
        let inv = a.inverse().unwrap();
        assert_close(&a.multiply(&inv).unwrap(), &Matrix::identity(3), 1e-12);
        assert_close(&inv.multiply(&a).unwrap(), &Matrix::identity(3), 1e-12);
    }

    #[test]
    fn test_inverse_singular() {
        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(matches!(a.inverse(), Err(Error::SingularMatrix { .. })));
    }

    #[test]
    fn test_inverse_not_square() {
        assert!(Matrix::zeros(2, 3).inverse().is_err());
    }
}
