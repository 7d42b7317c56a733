// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Command-line front end.
//!
//! Usage:
//!   haarface detect <cascade.xml> <image>                         # list raw detections
//!   haarface train <dataset-dir> -o model.txt                     # one sub-directory per label
//!   haarface recognize model.txt <image> --cascade <cascade.xml>  # detect, crop, recognize

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use image::GrayImage;
use log::{info, warn};

use haarface::{
    crop_and_resize, flatten_image, group_rectangles, load_cascade, load_model, save_model,
    Detector, EigenfaceTrainer, FisherfaceTrainer, HaarDetector, ImageData, Rectangle,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "haarface")]
#[command(author, version, about = "Haar cascade face detection and Fisherface recognition", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect faces and print every accepted window
    Detect {
        /// OpenCV cascade XML file
        cascade: PathBuf,

        /// Input image file
        image: PathBuf,

        /// Window growth factor between passes
        #[arg(long, default_value = "1.1")]
        scale_factor: f64,

        /// Smallest sliding step in pixels
        #[arg(long, default_value = "2")]
        min_step: u32,

        /// Cluster overlapping windows whose IoU exceeds this value
        #[arg(long)]
        group: Option<f64>,

        /// Minimum cluster size when grouping
        #[arg(long, default_value = "3")]
        min_neighbors: usize,
    },

    /// Train a recognizer from a directory with one sub-directory of images per integer label
    Train {
        dataset: PathBuf,

        /// Output model file
        #[arg(short, long)]
        output: PathBuf,

        /// Face width after resizing
        #[arg(long, default_value = "64")]
        width: u32,

        /// Face height after resizing
        #[arg(long, default_value = "64")]
        height: u32,

        /// Principal components (default: samples minus classes)
        #[arg(long)]
        num_pca: Option<usize>,

        /// Discriminant components (default: classes minus one)
        #[arg(long)]
        num_lda: Option<usize>,

        /// Train PCA-only Eigenfaces instead of Fisherfaces
        #[arg(long)]
        eigenfaces: bool,
    },

    /// Recognize the face on an image
    Recognize {
        /// Model written by `train`
        model: PathBuf,

        /// Input image file
        image: PathBuf,

        /// Detect faces first and recognize the largest one
        #[arg(long)]
        cascade: Option<PathBuf>,

        /// Face width used at training time
        #[arg(long, default_value = "64")]
        width: u32,

        /// Face height used at training time
        #[arg(long, default_value = "64")]
        height: u32,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = match args.command {
        Command::Detect {
            cascade,
            image,
            scale_factor,
            min_step,
            group,
            min_neighbors,
        } => detect(&cascade, &image, scale_factor, min_step, group, min_neighbors),
        Command::Train {
            dataset,
            output,
            width,
            height,
            num_pca,
            num_lda,
            eigenfaces,
        } => train(&dataset, &output, (width, height), num_pca, num_lda, eigenfaces),
        Command::Recognize {
            model,
            image,
            cascade,
            width,
            height,
        } => recognize(&model, &image, cascade.as_deref(), (width, height)),
    };

    if let Err(error) = result {
        println!("Error: {}", error);
        std::process::exit(1);
    }
}

fn open_gray(path: &Path) -> CliResult<GrayImage> {
    Ok(image::open(path)?.to_luma8())
}

fn detect(
    cascade: &Path,
    image: &Path,
    scale_factor: f64,
    min_step: u32,
    group: Option<f64>,
    min_neighbors: usize,
) -> CliResult<()> {
    let mut detector = HaarDetector::new(Arc::new(load_cascade(cascade)?));
    detector.set_scale_factor(scale_factor);
    detector.set_min_slide_step(min_step);

    let gray = open_gray(image)?;
    let (width, height) = gray.dimensions();
    let faces = detector.detect(&ImageData::new(gray.as_raw(), width, height));
    info!("{} windows accepted", faces.len());

    match group {
        Some(iou) => {
            for group in group_rectangles(&faces, iou, min_neighbors) {
                println!("{:?} ({} windows)", group.bbox(), group.members());
            }
        }
        None => {
            for face in &faces {
                println!("{:?}", face);
            }
        }
    }
    Ok(())
}

fn load_dataset(dataset: &Path, size: (u32, u32)) -> CliResult<(Vec<Vec<f64>>, Vec<i32>)> {
    let mut class_dirs: Vec<PathBuf> = fs::read_dir(dataset)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    class_dirs.sort();

    let mut images = Vec::new();
    let mut labels = Vec::new();
    for dir in class_dirs {
        let label: i32 = match dir.file_name().and_then(|n| n.to_str()).map(str::parse::<i32>) {
            Some(Ok(label)) => label,
            _ => {
                warn!("Skipping {}: directory name is not an integer label", dir.display());
                continue;
            }
        };

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        for file in files {
            let gray = match open_gray(&file) {
                Ok(gray) => gray,
                Err(error) => {
                    warn!("Skipping {}: {}", file.display(), error);
                    continue;
                }
            };
            images.push(face_vector(&gray, None, size)?);
            labels.push(label);
        }
    }
    Ok((images, labels))
}

/// Crop `roi` (or the whole frame) out of `gray`, resize it and flatten it.
fn face_vector(gray: &GrayImage, roi: Option<Rectangle>, size: (u32, u32)) -> CliResult<Vec<f64>> {
    let (width, height) = gray.dimensions();
    let frame = ImageData::new(gray.as_raw(), width, height);
    let roi = roi.unwrap_or_else(|| Rectangle::new(0, 0, width, height));
    let face = crop_and_resize(&frame, &roi, size.0, size.1)?;
    Ok(flatten_image(&ImageData::new(&face, size.0, size.1)))
}

fn train(
    dataset: &Path,
    output: &Path,
    size: (u32, u32),
    num_pca: Option<usize>,
    num_lda: Option<usize>,
    eigenfaces: bool,
) -> CliResult<()> {
    let (images, labels) = load_dataset(dataset, size)?;
    let mut classes = labels.clone();
    classes.sort_unstable();
    classes.dedup();
    info!("Loaded {} images of {} classes", images.len(), classes.len());

    let num_pca = num_pca.unwrap_or_else(|| images.len().saturating_sub(classes.len()).max(1));
    let model = if eigenfaces {
        EigenfaceTrainer::new(num_pca).train(&images, &labels)?
    } else {
        let num_lda = num_lda.unwrap_or_else(|| classes.len().saturating_sub(1).max(1));
        FisherfaceTrainer::new(num_pca, num_lda).train(&images, &labels)?
    };

    save_model(&model, output)?;
    info!("Saved model to {}", output.display());
    Ok(())
}

fn recognize(
    model: &Path,
    image: &Path,
    cascade: Option<&Path>,
    size: (u32, u32),
) -> CliResult<()> {
    let model = load_model(model)?;
    let gray = open_gray(image)?;

    let roi = match cascade {
        Some(cascade) => {
            let detector = HaarDetector::new(Arc::new(load_cascade(cascade)?));
            let (width, height) = gray.dimensions();
            let faces = detector.detect(&ImageData::new(gray.as_raw(), width, height));
            match faces.into_iter().max_by_key(Rectangle::area) {
                Some(face) => Some(face),
                None => {
                    println!("No face found");
                    return Ok(());
                }
            }
        }
        None => None,
    };

    let probe = face_vector(&gray, roi, size)?;
    let prediction = model.recognize(&probe)?;
    println!(
        "label {} (distance {:.3})",
        prediction.label, prediction.distance
    );
    Ok(())
}
