// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Face detection with boosted Haar cascades and face recognition with Fisherfaces.
//!
//! The two pipelines are independent: [`Detector`] turns a gray-scale frame into
//! candidate rectangles, and the [`recognizer`] module turns a cropped, flattened
//! face into a label. [`crop_and_resize`] and [`flatten_image`] connect them.

mod classifier;
mod common;
mod detector;
mod error;
mod integral;
pub mod math;
pub mod model;
pub mod recognizer;

pub use crate::classifier::{CascadeClassifier, IntegralImages};
pub use crate::common::{crop_and_resize, flatten_image, resize_image, ImageData, Rectangle};
pub use crate::detector::{detect_faces, group_rectangles, HaarDetector, RectangleGroup};
pub use crate::error::{Error, Result};
pub use crate::integral::IntegralImage;
pub use crate::model::{load_cascade, read_cascade, CascadeModel};
pub use crate::recognizer::{
    load_model, save_model, EigenfaceModel, EigenfaceTrainer, FisherfaceModel, FisherfaceTrainer,
    Prediction, ProjectionModel, SharedModel,
};

use std::path::Path;
use std::sync::Arc;

/// Create a face detector, based on an OpenCV cascade XML file.
pub fn create_detector<P: AsRef<Path>>(path_to_cascade: P) -> Result<Box<dyn Detector>> {
    let model = load_cascade(path_to_cascade)?;
    Ok(create_detector_with_model(Arc::new(model)))
}

/// Create a face detector, based on the provided cascade.
pub fn create_detector_with_model(model: Arc<CascadeModel>) -> Box<dyn Detector> {
    Box::new(HaarDetector::new(model))
}

/// Face detector.
///
/// Detection takes `&self`: one detector can serve several threads at once.
///
/// # Examples
///
/// ```no_run
/// use haarface::{Detector, ImageData};
///
/// let mut detector = haarface::create_detector("haarcascade_frontalface_default.xml").unwrap();
/// detector.set_scale_factor(1.2);
/// detector.set_min_slide_step(2);
///
/// let (width, height) = (640, 480);
/// let bytes = vec![0u8; (width * height) as usize];
/// let image = ImageData::new(&bytes, width, height);
/// for face in detector.detect(&image) {
///     println!("found face: {:?}", face);
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Detect faces on a gray-scale image.
    ///
    /// Every window accepted by the cascade is returned, in search order
    /// (smallest windows first, then row by row). Overlapping windows are not merged.
    ///
    /// # Panics
    ///
    /// Panics if `image` has `width` or `height` equal to 0.
    fn detect(&self, image: &ImageData) -> Vec<Rectangle>;

    /// Set the factor by which the window grows between passes. Default is 1.1.
    ///
    /// # Panics
    ///
    /// Panics if `scale_factor` is not a finite number greater than 1.
    fn set_scale_factor(&mut self, scale_factor: f64);

    /// Set the smallest sliding step; the step actually used is
    /// `max(min_slide_step, window_width / 10)`. Default is 2.
    ///
    /// # Panics
    ///
    /// Panics if `step` is 0.
    fn set_min_slide_step(&mut self, step: u32);

    /// Skip windows narrower than `min_window_size`. Default is 0.
    fn set_min_window_size(&mut self, min_window_size: u32);

    /// Stop the search once windows get wider than `max_window_size`.
    /// 0, the default, means no limit besides the image size.
    fn set_max_window_size(&mut self, max_window_size: u32);
}
