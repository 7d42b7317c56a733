// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Plain-text model files.
//!
//! Layout, one item per line, numbers separated by single spaces:
//!
//! ```text
//! image_size
//! num_pca
//! num_components
//! num_samples
//! mean (image_size numbers)
//! projection rows (image_size lines of num_components numbers)
//! training projections (num_samples lines of num_components numbers)
//! labels (num_samples integers)
//! ```
//!
//! Floats are written in their shortest round-trip form, so reading a file back
//! yields bit-identical values.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use log::debug;

use super::ProjectionModel;
use crate::error::{Error, Result};
use crate::math::Matrix;

/// Serialize `model` into `writer`.
pub fn write_to<W: Write>(model: &ProjectionModel, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", model.image_size())?;
    writeln!(writer, "{}", model.num_pca())?;
    writeln!(writer, "{}", model.num_components())?;
    writeln!(writer, "{}", model.num_samples())?;

    write_row(&mut writer, model.mean())?;
    let projection = model.projection();
    for i in 0..projection.rows() {
        write_row(&mut writer, projection.row(i))?;
    }
    let training = model.training_projections();
    for i in 0..training.rows() {
        write_row(&mut writer, training.row(i))?;
    }
    let labels: Vec<String> = model.labels().iter().map(i32::to_string).collect();
    writeln!(writer, "{}", labels.join(" "))?;

    writer.flush()?;
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, values: &[f64]) -> Result<()> {
    let mut first = true;
    for v in values {
        if !first {
            write!(writer, " ")?;
        }
        write!(writer, "{:?}", v)?;
        first = false;
    }
    writeln!(writer)?;
    Ok(())
}

/// Parse a model written by [`write_to`].
pub fn read_from<R: BufRead>(mut reader: R) -> Result<ProjectionModel> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut tokens = Tokens::new(&text);

    let image_size: usize = tokens.next("image size")?;
    let num_pca: usize = tokens.next("PCA component count")?;
    let num_components: usize = tokens.next("component count")?;
    let num_samples: usize = tokens.next("sample count")?;
    if image_size == 0 || num_components == 0 || num_samples == 0 {
        return Err(Error::Parse(format!(
            "illegal model header {} {} {} {}",
            image_size, num_pca, num_components, num_samples
        )));
    }

    let mean: Vec<f64> = tokens.take(image_size, "mean")?;
    let projection = Matrix::from_vec(
        image_size,
        num_components,
        tokens.take(image_size * num_components, "projection")?,
    )?;
    let training_projections = Matrix::from_vec(
        num_samples,
        num_components,
        tokens.take(num_samples * num_components, "training projections")?,
    )?;
    let labels: Vec<i32> = tokens.take(num_samples, "labels")?;
    tokens.finish()?;

    ProjectionModel::new(num_pca, mean, projection, training_projections, labels)
        .map_err(|e| Error::Parse(format!("inconsistent model: {}", e)))
}

/// Write `model` to a file, replacing any previous content.
pub fn save_model<P: AsRef<Path>>(model: &ProjectionModel, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::from_io(e, &path.display().to_string()))?;
    write_to(model, BufWriter::new(file))?;
    debug!("Saved model with {} samples to {}", model.num_samples(), path.display());
    Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ProjectionModel> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::from_io(e, &path.display().to_string()))?;
    let model = read_from(BufReader::new(file))?;
    debug!("Loaded model with {} samples from {}", model.num_samples(), path.display());
    Ok(model)
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Tokens {
            inner: text.split_whitespace(),
        }
    }

    fn next<T>(&mut self, what: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let token = self
            .inner
            .next()
            .ok_or_else(|| Error::Parse(format!("unexpected end of model while reading {}", what)))?;
        token
            .parse()
            .map_err(|e| Error::Parse(format!("bad {} value '{}': {}", what, token, e)))
    }

    fn take<T>(&mut self, count: usize, what: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        (0..count).map(|_| self.next(what)).collect()
    }

    fn finish(mut self) -> Result<()> {
        match self.inner.next() {
            None => Ok(()),
            Some(token) => Err(Error::Parse(format!(
                "trailing data after model: '{}'",
                token
            ))),
        }
    }
}
