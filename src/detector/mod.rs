// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

mod grouping;

use std::cmp;
use std::sync::Arc;

use log::trace;

use crate::classifier::{CascadeClassifier, IntegralImages};
use crate::common::{ImageData, Rectangle, Seq};
use crate::error::{Error, Result};
use crate::model::CascadeModel;
use crate::Detector;

pub use self::grouping::{group_rectangles, RectangleGroup};

const DEFAULT_SCALE_FACTOR: f64 = 1.1;
const DEFAULT_MIN_SLIDE_STEP: u32 = 2;

impl Detector for HaarDetector {
    fn detect(&self, image: &ImageData) -> Vec<Rectangle> {
        if image.is_empty() {
            panic!("Illegal image: {:?}", image);
        }

        let integrals =
            IntegralImages::for_model(&self.model, image.data(), image.width(), image.height());
        self.search(&integrals, image.width(), image.height())
    }

    fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor <= 1.0 || !scale_factor.is_finite() {
            panic!("Illegal scale factor: {}", scale_factor);
        }
        self.scale_factor = scale_factor;
    }

    fn set_min_slide_step(&mut self, step: u32) {
        if step == 0 {
            panic!("Illegal slide step: {}", step);
        }
        self.min_slide_step = step;
    }

    #[inline]
    fn set_min_window_size(&mut self, min_window_size: u32) {
        self.min_window_size = min_window_size;
    }

    #[inline]
    fn set_max_window_size(&mut self, max_window_size: u32) {
        self.max_window_size = max_window_size;
    }
}

/// Sliding-window detector running a Haar cascade over growing window sizes.
///
/// Accepted windows are reported as-is: overlapping hits are neither merged nor suppressed.
/// See [`group_rectangles`] for an optional clustering pass.
pub struct HaarDetector {
    model: Arc<CascadeModel>,
    scale_factor: f64,
    min_slide_step: u32,
    min_window_size: u32,
    max_window_size: u32,
}

impl HaarDetector {
    pub fn new(model: Arc<CascadeModel>) -> Self {
        HaarDetector {
            model,
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_slide_step: DEFAULT_MIN_SLIDE_STEP,
            min_window_size: 0,
            max_window_size: 0,
        }
    }

    pub fn model(&self) -> &CascadeModel {
        &self.model
    }

    /// Run the multi-scale search on prebuilt integral images of an `image_width x image_height` frame.
    pub fn search(
        &self,
        integrals: &IntegralImages,
        image_width: u32,
        image_height: u32,
    ) -> Vec<Rectangle> {
        let classifier = CascadeClassifier::new(&self.model, integrals);
        let base_width = f64::from(self.model.base_width());
        let base_height = f64::from(self.model.base_height());
        let scale_factor = self.scale_factor;

        let mut hits = Vec::new();
        for scale in Seq::new(1.0f64, move |s| s * scale_factor) {
            let window_width = (base_width * scale).floor() as u32;
            let window_height = (base_height * scale).floor() as u32;
            if window_width > image_width || window_height > image_height {
                break;
            }
            if self.max_window_size > 0 && window_width > self.max_window_size {
                break;
            }
            if window_width < self.min_window_size {
                continue;
            }

            let step = cmp::max(self.min_slide_step, window_width / 10);
            let scan = WindowScan {
                window_width,
                window_height,
                step,
                image_width,
                image_height,
            };
            let found = scan.run(&classifier);
            trace!(
                "window {}x{}, step {}: {} hits",
                window_width,
                window_height,
                step,
                found.len()
            );
            hits.extend(found);
        }
        hits
    }
}

/// Every position of one window size over the frame.
#[derive(Clone, Copy)]
struct WindowScan {
    window_width: u32,
    window_height: u32,
    step: u32,
    image_width: u32,
    image_height: u32,
}

impl WindowScan {
    fn rows(self) -> impl Iterator<Item = u32> {
        let step = self.step;
        Seq::new(0u32, move |y| y + step)
            .take_while(move |y| y + self.window_height <= self.image_height)
    }

    fn scan_row(self, classifier: &CascadeClassifier, y: u32) -> Vec<Rectangle> {
        let step = self.step;
        Seq::new(0u32, move |x| x + step)
            .take_while(move |x| x + self.window_width <= self.image_width)
            .map(|x| Rectangle::new(x as i32, y as i32, self.window_width, self.window_height))
            .filter(|window| classifier.classify(window))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn run(self, classifier: &CascadeClassifier) -> Vec<Rectangle> {
        use rayon::prelude::*;

        let rows: Vec<u32> = self.rows().collect();
        let per_row: Vec<Vec<Rectangle>> = rows
            .par_iter()
            .map(|&y| self.scan_row(classifier, y))
            .collect();
        per_row.into_iter().flatten().collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn run(self, classifier: &CascadeClassifier) -> Vec<Rectangle> {
        self.rows()
            .flat_map(|y| self.scan_row(classifier, y))
            .collect()
    }
}

/// Detect faces on a gray-scale pixel buffer with default search settings.
pub fn detect_faces(
    model: Arc<CascadeModel>,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<Rectangle>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "illegal image size {}x{}",
            width, height
        )));
    }
    let image = ImageData::try_new(pixels, width, height)?;
    Ok(HaarDetector::new(model).detect(&image))
}
