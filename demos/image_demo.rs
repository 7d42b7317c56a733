// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::env::Args;
use std::time::Instant;

use image::{GrayImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::info;

use haarface::{group_rectangles, Detector, ImageData, Rectangle};

const OUTPUT_FILE: &str = "test.png";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match Options::parse(std::env::args()) {
        Ok(options) => options,
        Err(message) => {
            println!("Failed to parse program arguments: {}", message);
            std::process::exit(1)
        }
    };

    let mut detector = match haarface::create_detector(options.cascade_path()) {
        Ok(detector) => detector,
        Err(error) => {
            println!("Failed to create detector: {}", error);
            std::process::exit(1)
        }
    };

    detector.set_scale_factor(1.2);
    detector.set_min_slide_step(2);
    detector.set_min_window_size(30);

    let image = match image::open(options.image_path()) {
        Ok(image) => image,
        Err(message) => {
            println!("Failed to read image: {}", message);
            std::process::exit(1)
        }
    };

    let mut rgb = image.to_rgb8();
    let faces = detect_faces(&*detector, &image.to_luma8());

    for group in group_rectangles(&faces, 0.3, 3) {
        let bbox = group.bbox();
        let rect = Rect::at(bbox.x(), bbox.y()).of_size(bbox.width(), bbox.height());

        draw_hollow_rect_mut(&mut rgb, rect, Rgb([255, 0, 0]));
    }

    match rgb.save(OUTPUT_FILE) {
        Ok(_) => println!("Saved result to {}", OUTPUT_FILE),
        Err(message) => println!("Failed to save result to a file. Reason: {}", message),
    }
}

fn detect_faces(detector: &dyn Detector, gray: &GrayImage) -> Vec<Rectangle> {
    let (width, height) = gray.dimensions();
    let image = ImageData::new(gray.as_raw(), width, height);
    let now = Instant::now();
    let faces = detector.detect(&image);
    info!(
        "Found {} windows in {} ms",
        faces.len(),
        now.elapsed().as_millis()
    );
    faces
}

struct Options {
    image_path: String,
    cascade_path: String,
}

impl Options {
    fn parse(args: Args) -> Result<Self, String> {
        let args: Vec<String> = args.collect();
        if args.len() != 3 {
            return Err(format!("Usage: {} <cascade-path> <image-path>", args[0]));
        }

        let cascade_path = args[1].clone();
        let image_path = args[2].clone();

        Ok(Options {
            image_path,
            cascade_path,
        })
    }

    fn image_path(&self) -> &str {
        &self.image_path[..]
    }

    fn cascade_path(&self) -> &str {
        &self.cascade_path[..]
    }
}
