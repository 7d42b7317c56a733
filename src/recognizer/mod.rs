// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Appearance-based face recognition: Fisherfaces (PCA followed by LDA)
//! and the lighter PCA-only Eigenfaces, both matched by nearest neighbour.

mod persist;
mod shared;
mod training;

use crate::error::{Error, Result};
use crate::math::{squared_distance, vector_sub, Matrix};

pub use self::persist::{load_model, read_from, save_model, write_to};
pub use self::shared::SharedModel;
pub use self::training::{train_eigenfaces, train_fisherfaces, EigenfaceTrainer, FisherfaceTrainer};

/// Trained linear projection plus the projected training set it is matched against.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionModel {
    image_size: usize,
    num_pca: usize,
    mean: Vec<f64>,
    /// `image_size x num_components`
    projection: Matrix,
    /// `num_samples x num_components`, one training sample per row
    training_projections: Matrix,
    labels: Vec<i32>,
}

/// Model produced by [`FisherfaceTrainer`].
pub type FisherfaceModel = ProjectionModel;

/// Model produced by [`EigenfaceTrainer`]: the projection is the PCA basis itself.
pub type EigenfaceModel = ProjectionModel;

/// Result of a nearest-neighbour lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub label: i32,
    /// Squared Euclidean distance to the nearest training projection.
    pub distance: f64,
}

impl ProjectionModel {
    /// Assemble a model, checking that all parts agree on their dimensions.
    pub fn new(
        num_pca: usize,
        mean: Vec<f64>,
        projection: Matrix,
        training_projections: Matrix,
        labels: Vec<i32>,
    ) -> Result<Self> {
        let image_size = mean.len();
        if image_size == 0 {
            return Err(Error::InvalidInput("empty mean vector".to_string()));
        }
        if projection.rows() != image_size {
            return Err(Error::DimensionMismatch {
                expected: image_size,
                actual: projection.rows(),
            });
        }
        let num_components = projection.cols();
        if num_components == 0 || num_components > num_pca {
            return Err(Error::InvalidInput(format!(
                "{} components with {} principal components",
                num_components, num_pca
            )));
        }
        if training_projections.cols() != num_components {
            return Err(Error::DimensionMismatch {
                expected: num_components,
                actual: training_projections.cols(),
            });
        }
        if labels.is_empty() || training_projections.rows() != labels.len() {
            return Err(Error::DimensionMismatch {
                expected: labels.len(),
                actual: training_projections.rows(),
            });
        }

        Ok(ProjectionModel {
            image_size,
            num_pca,
            mean,
            projection,
            training_projections,
            labels,
        })
    }

    /// Flattened pixel count every probe must have.
    pub fn image_size(&self) -> usize {
        self.image_size
    }

    pub fn num_pca(&self) -> usize {
        self.num_pca
    }

    /// Dimension of the projected space.
    pub fn num_components(&self) -> usize {
        self.projection.cols()
    }

    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn projection(&self) -> &Matrix {
        &self.projection
    }

    pub fn training_projections(&self) -> &Matrix {
        &self.training_projections
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Center `image` by the stored mean and map it into the projected space.
    pub fn project(&self, image: &[f64]) -> Result<Vec<f64>> {
        if image.len() != self.image_size {
            return Err(Error::DimensionMismatch {
                expected: self.image_size,
                actual: image.len(),
            });
        }
        let centered = vector_sub(image, &self.mean);
        self.projection.transpose_mul_vector(&centered)
    }

    /// Label of the training sample nearest to `image` in the projected space.
    ///
    /// The first sample wins on equal distances. There is no rejection threshold.
    pub fn recognize(&self, image: &[f64]) -> Result<Prediction> {
        let probe = self.project(image)?;

        let mut best = Prediction {
            label: self.labels[0],
            distance: f64::MAX,
        };
        for (i, &label) in self.labels.iter().enumerate() {
            let distance = squared_distance(&probe, self.training_projections.row(i));
            if distance < best.distance {
                best = Prediction { label, distance };
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> ProjectionModel {
        // identity projection over 2 pixels, 3 stored samples
        ProjectionModel::new(
            2,
            vec![1.0, 1.0],
            Matrix::identity(2),
            Matrix::from_vec(3, 2, vec![0.0, 0.0, 5.0, 5.0, -5.0, 5.0]).unwrap(),
            vec![7, 8, 9],
        )
        .unwrap()
    }

    #[test]
    fn test_recognize_nearest() {
        let model = tiny_model();
        let prediction = model.recognize(&[5.0, 6.0]).unwrap();
        assert_eq!(8, prediction.label);
        assert_eq!(1.0, prediction.distance);
        assert_eq!(7, model.recognize(&[1.0, 1.0]).unwrap().label);
    }

    #[test]
    fn test_tie_keeps_first_sample() {
        let model = tiny_model();
        // equidistant from samples 8 and 9
        assert_eq!(8, model.recognize(&[1.0, 11.0]).unwrap().label);
    }

    #[test]
    fn test_probe_dimension_mismatch() {
        let model = tiny_model();
        assert!(matches!(
            model.recognize(&[1.0, 2.0, 3.0]),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_new_checks_shapes() {
        let result = ProjectionModel::new(
            2,
            vec![0.0, 0.0],
            Matrix::identity(2),
            Matrix::zeros(2, 2),
            vec![1, 2, 3],
        );
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));

        let result = ProjectionModel::new(
            1,
            vec![0.0, 0.0],
            Matrix::identity(2),
            Matrix::zeros(1, 2),
            vec![1],
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
