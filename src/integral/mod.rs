// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Summed-area tables over gray-scale images.
//!
//! The standard table answers axis-aligned rectangle sums in constant time,
//! the rotated ("tilted") table answers sums over rectangles turned by 45 degrees.

use num::traits::AsPrimitive;

/// Running-sum image with the same extents as its source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegralImage {
    width: u32,
    height: u32,
    data: Vec<i64>,
}

impl IntegralImage {
    /// Build the standard integral image:
    /// `standard[x, y]` is the sum of every pixel with both coordinates `<=` `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len()` is not equal to `width * height`.
    pub fn standard<P: AsPrimitive<i64>>(pixels: &[P], width: u32, height: u32) -> Self {
        let length = Self::check_length(pixels.len(), width, height);
        let w = width as usize;
        let mut data = vec![0i64; length];

        for y in 0..height as usize {
            let mut row_sum = 0i64;
            for x in 0..w {
                let i = y * w + x;
                row_sum += pixels[i].as_();
                data[i] = if y == 0 { row_sum } else { data[i - w] + row_sum };
            }
        }

        IntegralImage {
            width,
            height,
            data,
        }
    }

    /// Build the rotated integral image with the recurrence
    /// `T(x, y) = f(x, y) + T(x - 1, y - 1) + T(x + 1, y - 1) - T(x, y - 2)`,
    /// where every out-of-bounds operand is 0.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len()` is not equal to `width * height`.
    pub fn rotated<P: AsPrimitive<i64>>(pixels: &[P], width: u32, height: u32) -> Self {
        let length = Self::check_length(pixels.len(), width, height);
        let mut tilted = IntegralImage {
            width,
            height,
            data: vec![0i64; length],
        };

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let i = tilted.index(x, y);
                let value = pixels[i].as_() + tilted.get(x - 1, y - 1) + tilted.get(x + 1, y - 1)
                    - tilted.get(x, y - 2);
                tilted.data[i] = value;
            }
        }

        tilted
    }

    fn check_length(length: usize, width: u32, height: u32) -> usize {
        let expected = width as usize * height as usize;
        if length != expected {
            panic!(
                "Illegal arguments: {} pixels for a {}x{} image",
                length, width, height
            );
        }
        expected
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Table value at `(x, y)`, or 0 when the coordinate lies outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> i64 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[self.index(x, y)]
    }

    /// Standard table lookup used by rectangle sums: 0 above or left of the
    /// image, clamped to the last column/row past the right or bottom edge.
    #[inline]
    fn corner(&self, x: i32, y: i32) -> i64 {
        if x < 0 || y < 0 || self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = x.min(self.width as i32 - 1);
        let y = y.min(self.height as i32 - 1);
        self.data[self.index(x, y)]
    }

    /// Sum of the `width x height` block whose top-left pixel is `(x, y)`,
    /// computed as `D - B - C + A` on a standard integral image.
    #[inline]
    pub fn rect_sum(&self, x: i32, y: i32, width: i32, height: i32) -> i64 {
        let x2 = x + width - 1;
        let y2 = y + height - 1;

        let a = self.corner(x - 1, y - 1);
        let b = self.corner(x2, y - 1);
        let c = self.corner(x - 1, y2);
        let d = self.corner(x2, y2);

        d - b - c + a
    }

    /// Sum over a 45-degree rectangle with top corner `(x, y)` and side lengths
    /// `width`, `height` along the two diagonal axes, on a rotated integral image.
    #[inline]
    pub fn rotated_rect_sum(&self, x: i32, y: i32, width: i32, height: i32) -> i64 {
        let p = self.get(x, y);
        let q = self.get(x + width, y + width);
        let r = self.get(x - height, y + height);
        let s = self.get(x + width - height, y + width + height);

        p + s - q - r
    }
}
