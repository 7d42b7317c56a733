// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Dense linear algebra used by the recognizers.

mod eigen;
mod matrix;

pub use self::eigen::{jacobi_eigen, jacobi_eigen_with, Eigen, JACOBI_TOLERANCE};
pub use self::matrix::Matrix;

/// Element-wise `left - right`.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn vector_sub(left: &[f64], right: &[f64]) -> Vec<f64> {
    assert_eq!(left.len(), right.len(), "vector lengths differ");
    left.iter().zip(right).map(|(l, r)| l - r).collect()
}

pub fn vector_inner_product(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(l, r)| l * r).sum()
}

/// Euclidean norm.
pub fn norm(v: &[f64]) -> f64 {
    vector_inner_product(v, v).sqrt()
}

/// Scale `v` to unit length in place. A zero vector is left untouched.
pub fn normalize(v: &mut [f64]) {
    let n = norm(v);
    if n > 0.0 {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
}

#[inline]
pub fn squared_distance(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| {
            let d = l - r;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_sub() {
        assert_eq!(vec![1.0, -1.0, 0.5], vector_sub(&[2.0, 0.0, 1.0], &[1.0, 1.0, 0.5]));
    }

    #[test]
    fn test_inner_product() {
        assert_eq!(32.0, vector_inner_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
        assert!((norm(&v) - 1.0).abs() < 1e-12);

        let mut zero = vec![0.0; 3];
        normalize(&mut zero);
        assert_eq!(vec![0.0; 3], zero);
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(25.0, squared_distance(&[0.0, 0.0], &[3.0, 4.0]));
    }
}
