// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use log::debug;

use super::Matrix;
use crate::error::{Error, Result};

/// Off-diagonal magnitude under which the Jacobi sweep stops.
pub const JACOBI_TOLERANCE: f64 = 1e-10;

/// Eigenpairs of a symmetric matrix: `vectors.column(i)` belongs to `values[i]`.
#[derive(Clone, Debug)]
pub struct Eigen {
    pub values: Vec<f64>,
    pub vectors: Matrix,
}

impl Eigen {
    /// Indices of the eigenvalues from largest to smallest. Ties keep their original order.
    pub fn descending_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[b].total_cmp(&self.values[a]));
        order
    }

    /// Eigenvector of `values[i]`.
    pub fn vector(&self, i: usize) -> Vec<f64> {
        self.vectors.column(i)
    }
}

/// Eigen-decomposition of a real symmetric matrix by cyclic Jacobi rotations,
/// with the default tolerance and a budget of `100 * n` rotations.
///
/// `a` is not modified. Running out of rotations is not an error: the current
/// approximation is returned.
pub fn jacobi_eigen(a: &Matrix) -> Result<Eigen> {
    jacobi_eigen_with(a, JACOBI_TOLERANCE, 100 * a.rows())
}

pub fn jacobi_eigen_with(a: &Matrix, tolerance: f64, max_iterations: usize) -> Result<Eigen> {
    if !a.is_square() {
        return Err(Error::DimensionMismatch {
            expected: a.rows(),
            actual: a.cols(),
        });
    }
    let n = a.rows();
    let mut a = a.clone();
    let mut v = Matrix::identity(n);

    let mut converged = n < 2;
    for _ in 0..max_iterations {
        let (p, q, max) = largest_off_diagonal(&a);
        if max < tolerance {
            converged = true;
            break;
        }
        rotate(&mut a, &mut v, p, q);
    }
    if !converged {
        let (_, _, max) = largest_off_diagonal(&a);
        converged = max < tolerance;
        if !converged {
            debug!(
                "Jacobi: {}x{} matrix not converged after {} rotations (off-diagonal {:e})",
                n, n, max_iterations, max
            );
        }
    }

    let values = (0..n).map(|i| a[(i, i)]).collect();
    Ok(Eigen { values, vectors: v })
}

fn largest_off_diagonal(a: &Matrix) -> (usize, usize, f64) {
    let n = a.rows();
    let (mut p, mut q, mut max) = (0, 0, 0.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let value = a[(i, j)].abs();
            if value > max {
                max = value;
                p = i;
                q = j;
            }
        }
    }
    (p, q, max)
}

/// Zero `a[p, q]` with one rotation and accumulate it into `v`.
fn rotate(a: &mut Matrix, v: &mut Matrix, p: usize, q: usize) {
    let n = a.rows();
    let apq = a[(p, q)];
    let app = a[(p, p)];
    let aqq = a[(q, q)];

    let theta = (aqq - app) / (2.0 * apq);
    // sign(0) taken as +1 so equal diagonals still rotate
    let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
    let t = sign / (theta.abs() + (1.0 + theta * theta).sqrt());
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;
    let tau = s / (1.0 + c);

    a[(p, p)] = app - t * apq;
    a[(q, q)] = aqq + t * apq;
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    for i in 0..n {
        if i == p || i == q {
            continue;
        }
        let aip = a[(i, p)];
        let aiq = a[(i, q)];
        a[(i, p)] = aip - s * (aiq + tau * aip);
        a[(p, i)] = a[(i, p)];
        a[(i, q)] = aiq + s * (aip - tau * aiq);
        a[(q, i)] = a[(i, q)];
    }

    for i in 0..n {
        let vip = v[(i, p)];
        let viq = v[(i, q)];
        v[(i, p)] = vip - s * (viq + tau * vip);
        v[(i, q)] = viq + s * (vip - tau * viq);
    }
}
