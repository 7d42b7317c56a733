// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Matrix is singular or nearly singular (pivot {pivot:e})")]
    SingularMatrix { pivot: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("Remote fetch error: {0}")]
    Remote(#[from] reqwest::Error),
}

impl Error {
    /// Map an I/O failure on `resource`, turning "not found" into [`Error::ResourceNotFound`].
    pub(crate) fn from_io(error: std::io::Error, resource: &str) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Error::ResourceNotFound(resource.to_string())
        } else {
            Error::Io(error)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
