// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

mod reader;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

use self::reader::CascadeReader;

/// Rectangle of a Haar feature, in base-window coordinates, with its weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub weight: f64,
}

impl WeightedRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32, weight: f64) -> Self {
        WeightedRect {
            x,
            y,
            width,
            height,
            weight,
        }
    }
}

/// Haar feature: weighted rectangles evaluated on the standard
/// or, when `tilted`, on the rotated integral image.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    rects: Vec<WeightedRect>,
    tilted: bool,
}

impl Feature {
    pub fn new(rects: Vec<WeightedRect>, tilted: bool) -> Self {
        Feature { rects, tilted }
    }

    pub fn rects(&self) -> &[WeightedRect] {
        &self.rects
    }

    pub fn is_tilted(&self) -> bool {
        self.tilted
    }
}

/// Depth-1 decision stump voting on one feature of the cascade-global table.
///
/// Cascade files may describe deeper trees; only the root split is modelled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeakClassifier {
    feature_index: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl WeakClassifier {
    pub fn new(feature_index: usize, threshold: f64, left_value: f64, right_value: f64) -> Self {
        WeakClassifier {
            feature_index,
            threshold,
            left_value,
            right_value,
        }
    }

    pub fn feature_index(&self) -> usize {
        self.feature_index
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn left_value(&self) -> f64 {
        self.left_value
    }

    pub fn right_value(&self) -> f64 {
        self.right_value
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    threshold: f64,
    weak_classifiers: Vec<WeakClassifier>,
}

impl Stage {
    pub fn new(threshold: f64, weak_classifiers: Vec<WeakClassifier>) -> Self {
        Stage {
            threshold,
            weak_classifiers,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn weak_classifiers(&self) -> &[WeakClassifier] {
        &self.weak_classifiers
    }
}

/// Trained boosted cascade. Immutable once built and safe to share between threads.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeModel {
    base_width: u32,
    base_height: u32,
    stages: Vec<Stage>,
    features: Vec<Feature>,
}

impl CascadeModel {
    /// Assemble a cascade, checking that the window is not empty, that there is
    /// at least one stage and that every weak classifier points into `features`.
    pub fn new(
        base_width: u32,
        base_height: u32,
        stages: Vec<Stage>,
        features: Vec<Feature>,
    ) -> Result<Self> {
        if base_width == 0 || base_height == 0 {
            return Err(Error::Parse(format!(
                "illegal base window size {}x{}",
                base_width, base_height
            )));
        }
        if stages.is_empty() {
            return Err(Error::Parse("cascade has no stages".to_string()));
        }
        for (stage_index, stage) in stages.iter().enumerate() {
            for wc in stage.weak_classifiers() {
                if wc.feature_index() >= features.len() {
                    return Err(Error::Parse(format!(
                        "stage {} references feature {} but only {} features are defined",
                        stage_index,
                        wc.feature_index(),
                        features.len()
                    )));
                }
            }
        }

        Ok(CascadeModel {
            base_width,
            base_height,
            stages,
            features,
        })
    }

    pub fn base_width(&self) -> u32 {
        self.base_width
    }

    pub fn base_height(&self) -> u32 {
        self.base_height
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[inline]
    pub fn feature(&self, index: usize) -> &Feature {
        &self.features[index]
    }

    /// True when some feature needs the rotated integral image.
    pub fn has_tilted_features(&self) -> bool {
        self.features.iter().any(Feature::is_tilted)
    }
}

/// Parse a cascade from the text of an OpenCV cascade XML description.
pub fn read_cascade(description: &str) -> Result<CascadeModel> {
    CascadeReader::new(description).read()
}

/// Load a cascade from an XML file.
pub fn load_cascade<P: AsRef<Path>>(path: P) -> Result<CascadeModel> {
    let path = path.as_ref();
    let description =
        fs::read_to_string(path).map_err(|e| Error::from_io(e, &path.display().to_string()))?;
    read_cascade(&description)
}

/// Fetch a cascade description over HTTP and parse it.
#[cfg(feature = "remote")]
pub fn load_cascade_from_url(url: &str) -> Result<CascadeModel> {
    let response = reqwest::blocking::get(url)?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::ResourceNotFound(url.to_string()));
    }
    let description = response.error_for_status()?.text()?;
    read_cascade(&description)
}
