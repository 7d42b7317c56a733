// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

mod image_data;

use std::cmp;
use std::mem;

pub use self::image_data::{crop_and_resize, flatten_image, resize_image, ImageData};

/// Axis-aligned rectangle in image coordinates.
///
/// Also used as the detection window: `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn set_x(&mut self, x: i32) {
        self.x = x;
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn set_y(&mut self, y: i32) {
        self.y = y;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Intersection over union of two rectangles, in `[0, 1]`.
    pub fn iou(&self, other: &Rectangle) -> f64 {
        let x1 = cmp::max(self.x, other.x);
        let y1 = cmp::max(self.y, other.y);
        let x2 = cmp::min(
            self.x + self.width as i32 - 1,
            other.x + other.width as i32 - 1,
        );
        let y2 = cmp::min(
            self.y + self.height as i32 - 1,
            other.y + other.height as i32 - 1,
        );

        let w = x2 - x1 + 1;
        let h = y2 - y1 + 1;
        if w <= 0 || h <= 0 {
            return 0.0;
        }

        let area_intersect = (w as f64) * (h as f64);
        let area_union = self.area() as f64 + other.area() as f64 - area_intersect;
        if area_union <= 0.0 {
            0.0
        } else {
            area_intersect / area_union
        }
    }
}

pub struct Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    generator: G,
    next: T,
}

impl<T, G> Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    pub fn new(first_element: T, generator: G) -> Self {
        Seq {
            generator,
            next: first_element,
        }
    }
}

impl<T, G> Iterator for Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let next = (self.generator)(&self.next);
        let current = mem::replace(&mut self.next, next);
        Some(current)
    }
}
