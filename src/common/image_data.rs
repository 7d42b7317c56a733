// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::cmp;

use super::Rectangle;
use crate::error::{Error, Result};

/// Borrowed view of a gray-scale image, one byte per pixel, row-major.
#[derive(Debug, Clone, Copy)]
pub struct ImageData<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> ImageData<'a> {
    /// Wrap a gray-scale pixel buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not equal to `width * height`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        match Self::try_new(data, width, height) {
            Ok(image) => image,
            Err(e) => panic!("Illegal image: {}", e),
        }
    }

    /// Wrap a gray-scale pixel buffer, checking its length against the dimensions.
    pub fn try_new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(ImageData {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Bilinear resize of `src` into a freshly allocated `width x height` buffer.
pub fn resize_image(src: &ImageData, width: u32, height: u32) -> Vec<u8> {
    if src.width() == width && src.height() == height {
        return src.data().to_vec();
    }

    let mut dest = vec![0u8; width as usize * height as usize];
    if src.is_empty() {
        return dest;
    }

    let lf_x_scl = f64::from(src.width()) / f64::from(width);
    let lf_y_scl = f64::from(src.height()) / f64::from(height);
    let max_x = src.width() - 1;
    let max_y = src.height() - 1;

    for y in 0..height {
        for x in 0..width {
            let lf_x_s = lf_x_scl * f64::from(x);
            let lf_y_s = lf_y_scl * f64::from(y);

            let n_x_s = cmp::min(lf_x_s as u32, max_x.saturating_sub(1));
            let n_y_s = cmp::min(lf_y_s as u32, max_y.saturating_sub(1));
            let n_x_s1 = cmp::min(n_x_s + 1, max_x);
            let n_y_s1 = cmp::min(n_y_s + 1, max_y);

            let lf_weight_x = (lf_x_s - f64::from(n_x_s)).min(1.0);
            let lf_weight_y = (lf_y_s - f64::from(n_y_s)).min(1.0);

            let d1 = f64::from(src.pixel(n_x_s, n_y_s));
            let d2 = f64::from(src.pixel(n_x_s1, n_y_s));
            let d3 = f64::from(src.pixel(n_x_s, n_y_s1));
            let d4 = f64::from(src.pixel(n_x_s1, n_y_s1));

            let dest_val = (1.0 - lf_weight_y) * ((1.0 - lf_weight_x) * d1 + lf_weight_x * d2)
                + lf_weight_y * ((1.0 - lf_weight_x) * d3 + lf_weight_x * d4);

            dest[(y * width + x) as usize] = dest_val as u8;
        }
    }

    dest
}

/// Cut `roi` out of `image` and resize it to `width x height`.
///
/// Parts of `roi` lying outside the image are padded with zeros.
pub fn crop_and_resize(
    image: &ImageData,
    roi: &Rectangle,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    if roi.width() == 0 || roi.height() == 0 {
        return Err(Error::InvalidInput(format!("empty region {:?}", roi)));
    }
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "illegal output size {}x{}",
            width, height
        )));
    }

    let roi_width = roi.width() as i64;
    let roi_height = roi.height() as i64;
    let img_width = i64::from(image.width());
    let img_height = i64::from(image.height());

    let mut window = vec![0u8; (roi_width * roi_height) as usize];
    for wy in 0..roi_height {
        let sy = i64::from(roi.y()) + wy;
        if sy < 0 || sy >= img_height {
            continue;
        }
        for wx in 0..roi_width {
            let sx = i64::from(roi.x()) + wx;
            if sx < 0 || sx >= img_width {
                continue;
            }
            window[(wy * roi_width + wx) as usize] = image.pixel(sx as u32, sy as u32);
        }
    }

    let window = ImageData::new(&window, roi.width(), roi.height());
    Ok(resize_image(&window, width, height))
}

/// Flatten an image into the `f64` sample vector consumed by the recognizers.
pub fn flatten_image(image: &ImageData) -> Vec<f64> {
    image.data().iter().map(|&p| f64::from(p)).collect()
}
