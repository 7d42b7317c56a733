// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use num::traits::AsPrimitive;

use crate::common::Rectangle;
use crate::integral::IntegralImage;
use crate::model::{CascadeModel, Feature, Stage, WeakClassifier};

/// Integral images of one frame: the standard table, plus the rotated one
/// when the cascade has tilted features.
#[derive(Clone, Debug)]
pub struct IntegralImages {
    standard: IntegralImage,
    rotated: Option<IntegralImage>,
}

impl IntegralImages {
    pub fn new<P: AsPrimitive<i64>>(pixels: &[P], width: u32, height: u32, with_rotated: bool) -> Self {
        let standard = IntegralImage::standard(pixels, width, height);
        let rotated = if with_rotated {
            Some(IntegralImage::rotated(pixels, width, height))
        } else {
            None
        };
        IntegralImages { standard, rotated }
    }

    /// Build exactly the tables `model` needs.
    pub fn for_model<P: AsPrimitive<i64>>(
        model: &CascadeModel,
        pixels: &[P],
        width: u32,
        height: u32,
    ) -> Self {
        Self::new(pixels, width, height, model.has_tilted_features())
    }

    pub fn standard(&self) -> &IntegralImage {
        &self.standard
    }

    pub fn rotated(&self) -> Option<&IntegralImage> {
        self.rotated.as_ref()
    }
}

/// Evaluates a cascade on windows of one frame.
pub struct CascadeClassifier<'a> {
    model: &'a CascadeModel,
    standard: &'a IntegralImage,
    rotated: Option<&'a IntegralImage>,
}

impl<'a> CascadeClassifier<'a> {
    /// # Panics
    ///
    /// Panics if the model has tilted features and `integrals` carries no rotated table.
    pub fn new(model: &'a CascadeModel, integrals: &'a IntegralImages) -> Self {
        if model.has_tilted_features() && integrals.rotated().is_none() {
            panic!("Cascade has tilted features but no rotated integral image was built");
        }
        CascadeClassifier {
            model,
            standard: integrals.standard(),
            rotated: integrals.rotated(),
        }
    }

    /// Weighted sum of the feature's rectangles, scaled from the base window to `window`.
    pub fn evaluate_feature(&self, feature: &Feature, window: &Rectangle) -> f64 {
        let scale_x = f64::from(window.width()) / f64::from(self.model.base_width());
        let scale_y = f64::from(window.height()) / f64::from(self.model.base_height());

        // halves go to the even neighbour, so 2.5 reads column 2
        let mut sum = 0.0;
        for rect in feature.rects() {
            let rx = window.x() + (f64::from(rect.x) * scale_x).round_ties_even() as i32;
            let ry = window.y() + (f64::from(rect.y) * scale_y).round_ties_even() as i32;
            let rw = (f64::from(rect.width) * scale_x).round_ties_even() as i32;
            let rh = (f64::from(rect.height) * scale_y).round_ties_even() as i32;

            let rect_sum = match (feature.is_tilted(), self.rotated) {
                (true, Some(rotated)) => rotated.rotated_rect_sum(rx, ry, rw, rh),
                _ => self.standard.rect_sum(rx, ry, rw, rh),
            };
            sum += rect.weight * rect_sum as f64;
        }
        sum
    }

    /// Vote of a decision stump: left leaf below the threshold, right leaf otherwise.
    #[inline]
    pub fn evaluate_weak_classifier(&self, wc: &WeakClassifier, window: &Rectangle) -> f64 {
        let feature_value = self.evaluate_feature(self.model.feature(wc.feature_index()), window);
        if feature_value < wc.threshold() {
            wc.left_value()
        } else {
            wc.right_value()
        }
    }

    /// Every weak classifier votes; the stage passes unless the sum is below its threshold.
    pub fn evaluate_stage(&self, stage: &Stage, window: &Rectangle) -> bool {
        let stage_sum: f64 = stage
            .weak_classifiers()
            .iter()
            .map(|wc| self.evaluate_weak_classifier(wc, window))
            .sum();
        stage_sum >= stage.threshold()
    }

    /// Run the stages in order, rejecting at the first one that fails.
    pub fn classify(&self, window: &Rectangle) -> bool {
        self.model
            .stages()
            .iter()
            .all(|stage| self.evaluate_stage(stage, window))
    }
}
