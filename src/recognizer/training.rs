// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use log::debug;

use super::{EigenfaceModel, FisherfaceModel, ProjectionModel};
use crate::error::{Error, Result};
use crate::math::{jacobi_eigen, normalize, vector_inner_product, vector_sub, Matrix};

/// Whitening drops directions of the within-class scatter with eigenvalues at or below this.
const WHITENING_TOLERANCE: f64 = 1e-10;

/// Trains Fisherfaces: a PCA subspace of `num_pca` components followed by
/// `num_lda` discriminant directions.
///
/// `num_lda` is usually at most the number of classes minus one, and `num_pca`
/// at most the number of samples minus the number of classes. Centering leaves
/// at most `samples - 1` directions with variance, so `num_pca == samples` is
/// accepted but its last component is noise.
#[derive(Clone, Copy, Debug)]
pub struct FisherfaceTrainer {
    num_pca: usize,
    num_lda: usize,
}

impl FisherfaceTrainer {
    pub fn new(num_pca: usize, num_lda: usize) -> Self {
        FisherfaceTrainer { num_pca, num_lda }
    }

    pub fn num_pca(&self) -> usize {
        self.num_pca
    }

    pub fn num_lda(&self) -> usize {
        self.num_lda
    }

    /// Build a model from flattened images and their labels.
    ///
    /// Fails with [`Error::InvalidInput`] on an empty set, images of different
    /// lengths, a label count that differs from the image count, or component
    /// counts outside `1 <= num_lda <= num_pca <= images.len()`.
    pub fn train(&self, images: &[Vec<f64>], labels: &[i32]) -> Result<FisherfaceModel> {
        validate_training_set(images, labels)?;
        if self.num_pca == 0 || self.num_pca > images.len() {
            return Err(Error::InvalidInput(format!(
                "num_pca must lie in 1..={}, got {}",
                images.len(),
                self.num_pca
            )));
        }
        if self.num_lda == 0 || self.num_lda > self.num_pca {
            return Err(Error::InvalidInput(format!(
                "num_lda must lie in 1..={}, got {}",
                self.num_pca, self.num_lda
            )));
        }

        note_rank_limit(self.num_pca, images.len());
        let pca = Pca::compute(images, self.num_pca)?;
        let lda_basis = discriminant_basis(&pca.projections, labels, self.num_pca, self.num_lda)?;
        let fisherfaces = pca.basis.multiply(&lda_basis)?;
        let training_projections = project_all(&fisherfaces, &pca.centered)?;

        debug!(
            "Trained Fisherfaces: {} samples of {} pixels, {} PCA / {} LDA components",
            images.len(),
            pca.mean.len(),
            self.num_pca,
            self.num_lda
        );

        ProjectionModel::new(
            self.num_pca,
            pca.mean,
            fisherfaces,
            training_projections,
            labels.to_vec(),
        )
    }
}

/// Trains Eigenfaces: the PCA stage of [`FisherfaceTrainer`] alone.
///
/// At most `samples - 1` components carry variance.
#[derive(Clone, Copy, Debug)]
pub struct EigenfaceTrainer {
    num_components: usize,
}

impl EigenfaceTrainer {
    pub fn new(num_components: usize) -> Self {
        EigenfaceTrainer { num_components }
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn train(&self, images: &[Vec<f64>], labels: &[i32]) -> Result<EigenfaceModel> {
        validate_training_set(images, labels)?;
        if self.num_components == 0 || self.num_components > images.len() {
            return Err(Error::InvalidInput(format!(
                "num_components must lie in 1..={}, got {}",
                images.len(),
                self.num_components
            )));
        }

        note_rank_limit(self.num_components, images.len());
        let pca = Pca::compute(images, self.num_components)?;
        let training_projections = project_all(&pca.basis, &pca.centered)?;

        debug!(
            "Trained Eigenfaces: {} samples of {} pixels, {} components",
            images.len(),
            pca.mean.len(),
            self.num_components
        );

        ProjectionModel::new(
            self.num_components,
            pca.mean,
            pca.basis,
            training_projections,
            labels.to_vec(),
        )
    }
}

pub fn train_fisherfaces(
    images: &[Vec<f64>],
    labels: &[i32],
    num_pca: usize,
    num_lda: usize,
) -> Result<FisherfaceModel> {
    FisherfaceTrainer::new(num_pca, num_lda).train(images, labels)
}

pub fn train_eigenfaces(
    images: &[Vec<f64>],
    labels: &[i32],
    num_components: usize,
) -> Result<EigenfaceModel> {
    EigenfaceTrainer::new(num_components).train(images, labels)
}

fn note_rank_limit(num_components: usize, num_samples: usize) {
    if num_components >= num_samples {
        debug!(
            "{} principal components from {} samples: centered data has rank at most {}, trailing components are noise",
            num_components,
            num_samples,
            num_samples.saturating_sub(1)
        );
    }
}

fn validate_training_set(images: &[Vec<f64>], labels: &[i32]) -> Result<()> {
    let first = match images.first() {
        Some(first) => first,
        None => return Err(Error::InvalidInput("no images provided".to_string())),
    };
    if first.is_empty() {
        return Err(Error::InvalidInput("images are empty".to_string()));
    }
    if images.len() != labels.len() {
        return Err(Error::InvalidInput(format!(
            "{} images but {} labels",
            images.len(),
            labels.len()
        )));
    }
    if let Some((i, image)) = images
        .iter()
        .enumerate()
        .find(|(_, image)| image.len() != first.len())
    {
        return Err(Error::InvalidInput(format!(
            "image {} has {} pixels, expected {}",
            i,
            image.len(),
            first.len()
        )));
    }
    Ok(())
}

/// Principal components of a training set.
struct Pca {
    mean: Vec<f64>,
    centered: Vec<Vec<f64>>,
    /// `image_size x num_components`, orthonormal columns
    basis: Matrix,
    /// per sample, its coordinates in `basis`
    projections: Vec<Vec<f64>>,
}

impl Pca {
    /// Eigenvectors of the pixel covariance, recovered from the eigenvectors of
    /// the `n x n` Gram matrix of the centered samples.
    fn compute(images: &[Vec<f64>], num_components: usize) -> Result<Pca> {
        let n = images.len();
        let image_size = images[0].len();

        let mut mean = vec![0.0; image_size];
        for image in images {
            for (m, &p) in mean.iter_mut().zip(image) {
                *m += p;
            }
        }
        for m in mean.iter_mut() {
            *m /= n as f64;
        }

        let centered: Vec<Vec<f64>> = images.iter().map(|image| vector_sub(image, &mean)).collect();

        let mut gram = Matrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let value = vector_inner_product(&centered[i], &centered[j]);
                gram[(i, j)] = value;
                gram[(j, i)] = value;
            }
        }

        let eigen = jacobi_eigen(&gram)?;
        let order = eigen.descending_order();

        let columns: Vec<Vec<f64>> = order
            .iter()
            .take(num_components)
            .map(|&index| {
                let weights = eigen.vector(index);
                let mut u = vec![0.0; image_size];
                for (sample, &w) in centered.iter().zip(&weights) {
                    for (ui, &x) in u.iter_mut().zip(sample) {
                        *ui += w * x;
                    }
                }
                normalize(&mut u);
                u
            })
            .collect();
        let basis = Matrix::from_columns(&columns)?;

        let projections = project_all(&basis, &centered)?;
        let projections = (0..n).map(|i| projections.row(i).to_vec()).collect();

        Ok(Pca {
            mean,
            centered,
            basis,
            projections,
        })
    }
}

/// Project each centered sample through `basis`; one sample per row of the result.
fn project_all(basis: &Matrix, centered: &[Vec<f64>]) -> Result<Matrix> {
    let mut out = Matrix::zeros(centered.len(), basis.cols());
    for (i, sample) in centered.iter().enumerate() {
        let coordinates = basis.transpose_mul_vector(sample)?;
        for (j, c) in coordinates.into_iter().enumerate() {
            out[(i, j)] = c;
        }
    }
    Ok(out)
}

/// LDA directions in PCA space, solved as an ordinary eigenproblem after
/// whitening the within-class scatter. Columns are unit length.
fn discriminant_basis(
    projections: &[Vec<f64>],
    labels: &[i32],
    dim: usize,
    num_lda: usize,
) -> Result<Matrix> {
    let n = projections.len();

    let mut overall_mean = vec![0.0; dim];
    for y in projections {
        for (m, &v) in overall_mean.iter_mut().zip(y) {
            *m += v;
        }
    }
    for m in overall_mean.iter_mut() {
        *m /= n as f64;
    }

    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    let mut within = Matrix::zeros(dim, dim);
    let mut between = Matrix::zeros(dim, dim);
    for &class in &classes {
        let members: Vec<&Vec<f64>> = projections
            .iter()
            .zip(labels)
            .filter(|(_, label)| **label == class)
            .map(|(y, _)| y)
            .collect();
        let count = members.len() as f64;

        let mut class_mean = vec![0.0; dim];
        for y in &members {
            for (m, &v) in class_mean.iter_mut().zip(y.iter()) {
                *m += v;
            }
        }
        for m in class_mean.iter_mut() {
            *m /= count;
        }

        for y in &members {
            let diff = vector_sub(y, &class_mean);
            add_outer_product(&mut within, &diff, 1.0);
        }
        let diff = vector_sub(&class_mean, &overall_mean);
        add_outer_product(&mut between, &diff, count);
    }

    let within_eigen = jacobi_eigen(&within)?;
    let mut inv_sqrt = Matrix::zeros(dim, dim);
    for (i, &d) in within_eigen.values.iter().enumerate() {
        inv_sqrt[(i, i)] = if d > WHITENING_TOLERANCE {
            1.0 / d.sqrt()
        } else {
            0.0
        };
    }
    let u = &within_eigen.vectors;
    let whitening = u.multiply(&inv_sqrt)?.multiply(&u.transpose())?;

    let m = whitening.multiply(&between)?.multiply(&whitening)?;
    let m_eigen = jacobi_eigen(&m)?;
    let order = m_eigen.descending_order();

    debug!(
        "LDA: {} classes, leading discriminant eigenvalue {:e}",
        classes.len(),
        order.first().map_or(0.0, |&i| m_eigen.values[i])
    );

    let mut basis = Matrix::zeros(dim, num_lda);
    for (column, &index) in order.iter().take(num_lda).enumerate() {
        let mut direction = whitening.mul_vector(&m_eigen.vector(index))?;
        normalize(&mut direction);
        basis.set_column(column, &direction)?;
    }
    Ok(basis)
}

fn add_outer_product(target: &mut Matrix, v: &[f64], scale: f64) {
    for (i, &vi) in v.iter().enumerate() {
        for (j, &vj) in v.iter().enumerate() {
            target[(i, j)] += scale * vi * vj;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::norm;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Three classes of noisy 4x4 patterns, three samples each.
    fn synthetic_faces() -> (Vec<Vec<f64>>, Vec<i32>) {
        let mut rng = StdRng::seed_from_u64(17);
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for _ in 0..3 {
                let image: Vec<f64> = (0..16)
                    .map(|p| {
                        let lit = p % 3 == class as usize;
                        let base = if lit { 200.0 } else { 40.0 };
                        base + rng.gen_range(-8.0..8.0)
                    })
                    .collect();
                images.push(image);
                labels.push(class * 10);
            }
        }
        (images, labels)
    }

    #[test]
    fn test_fisherfaces_self_match() {
        let (images, labels) = synthetic_faces();
        let model = FisherfaceTrainer::new(6, 2).train(&images, &labels).unwrap();

        assert_eq!(16, model.image_size());
        assert_eq!(2, model.num_components());
        assert_eq!(9, model.num_samples());
        for (image, &label) in images.iter().zip(&labels) {
            let prediction = model.recognize(image).unwrap();
            assert_eq!(label, prediction.label);
            assert!(prediction.distance < 1e-9);
        }
    }

    #[test]
    fn test_fisherface_columns_are_finite() {
        let (images, labels) = synthetic_faces();
        let model = train_fisherfaces(&images, &labels, 6, 2).unwrap();
        assert!(model.projection().as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_eigenfaces_basis_is_orthonormal() {
        let (images, labels) = synthetic_faces();
        let model = EigenfaceTrainer::new(4).train(&images, &labels).unwrap();
        let basis = model.projection();
        for i in 0..4 {
            assert!((norm(&basis.column(i)) - 1.0).abs() < 1e-9);
            for j in (i + 1)..4 {
                assert!(vector_inner_product(&basis.column(i), &basis.column(j)).abs() < 1e-6);
            }
        }
        for (image, &label) in images.iter().zip(&labels) {
            assert_eq!(label, model.recognize(image).unwrap().label);
        }
    }

    #[test]
    fn test_components_up_to_sample_count() {
        let (images, labels) = synthetic_faces();
        let model = EigenfaceTrainer::new(images.len()).train(&images, &labels).unwrap();
        assert_eq!(images.len(), model.num_components());
        assert!(model.projection().as_slice().iter().all(|v| v.is_finite()));
        for (image, &label) in images.iter().zip(&labels) {
            let prediction = model.recognize(image).unwrap();
            assert_eq!(label, prediction.label);
            assert!(prediction.distance < 1e-9);
        }
        assert!(matches!(
            EigenfaceTrainer::new(images.len() + 1).train(&images, &labels),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mean_is_stored() {
        let images = vec![vec![0.0, 2.0], vec![2.0, 4.0]];
        let model = train_eigenfaces(&images, &[1, 2], 1).unwrap();
        assert_eq!(&[1.0, 3.0], model.mean());
    }

    #[test]
    fn test_invalid_training_sets() {
        let trainer = FisherfaceTrainer::new(1, 1);
        assert!(matches!(trainer.train(&[], &[]), Err(Error::InvalidInput(_))));
        assert!(matches!(
            trainer.train(&[vec![1.0, 2.0], vec![3.0]], &[0, 1]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            trainer.train(&[vec![1.0, 2.0], vec![3.0, 4.0]], &[0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            trainer.train(&[vec![], vec![]], &[0, 1]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_component_counts() {
        let (images, labels) = synthetic_faces();
        assert!(matches!(
            FisherfaceTrainer::new(10, 2).train(&images, &labels),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            FisherfaceTrainer::new(3, 4).train(&images, &labels),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            FisherfaceTrainer::new(3, 0).train(&images, &labels),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            EigenfaceTrainer::new(0).train(&images, &labels),
            Err(Error::InvalidInput(_))
        ));
    }
}
