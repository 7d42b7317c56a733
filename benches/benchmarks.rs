#[macro_use]
extern crate criterion;

use std::sync::Arc;
use std::time::Duration;

use criterion::{Benchmark, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use haarface::math::{jacobi_eigen, vector_inner_product, Matrix};
use haarface::model::{Feature, Stage, WeakClassifier, WeightedRect};
use haarface::{CascadeModel, Detector, HaarDetector, ImageData, IntegralImage};

fn random_image(width: u32, height: u32) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..width * height).map(|_| rng.gen()).collect()
}

/// Two stages of edge and line features on a 24x24 window, one of them tilted.
fn synthetic_cascade() -> CascadeModel {
    let features = vec![
        Feature::new(
            vec![
                WeightedRect::new(0, 0, 12, 24, 1.0),
                WeightedRect::new(12, 0, 12, 24, -1.0),
            ],
            false,
        ),
        Feature::new(
            vec![
                WeightedRect::new(0, 0, 24, 8, -1.0),
                WeightedRect::new(0, 8, 24, 8, 2.0),
                WeightedRect::new(0, 16, 24, 8, -1.0),
            ],
            false,
        ),
        Feature::new(
            vec![
                WeightedRect::new(12, 0, 8, 8, -1.0),
                WeightedRect::new(12, 4, 4, 4, 2.0),
            ],
            true,
        ),
    ];
    let stages = vec![
        Stage::new(
            -0.5,
            vec![
                WeakClassifier::new(0, -200.0, -1.0, 1.0),
                WeakClassifier::new(1, 0.0, -1.0, 1.0),
            ],
        ),
        Stage::new(
            0.0,
            vec![
                WeakClassifier::new(2, 10.0, 1.0, -1.0),
                WeakClassifier::new(0, 500.0, 1.0, -1.0),
            ],
        ),
    ];
    CascadeModel::new(24, 24, stages, features).unwrap()
}

fn bench_integral(c: &mut Criterion) {
    let pixels = random_image(640, 480);
    c.bench_function("integral_standard_640x480", move |b| {
        b.iter(|| IntegralImage::standard(&pixels, 640, 480))
    });

    let pixels = random_image(640, 480);
    c.bench_function("integral_rotated_640x480", move |b| {
        b.iter(|| IntegralImage::rotated(&pixels, 640, 480))
    });
}

fn bench_search(c: &mut Criterion) {
    let detector = HaarDetector::new(Arc::new(synthetic_cascade()));
    let pixels = random_image(320, 240);

    c.bench(
        "multi_scale_search",
        Benchmark::new("search_320x240", move |b| {
            let image = ImageData::new(&pixels, 320, 240);
            b.iter(|| detector.detect(&image))
        })
        // Limit the measurement time and the sample size
        // to make sure the benchmark finishes in a feasible amount of time.
        .measurement_time(Duration::new(30, 0))
        .sample_size(20),
    );
}

fn bench_jacobi(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 40;
    let mut m = Matrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let value = rng.gen_range(-1.0..1.0);
            m[(i, j)] = value;
            m[(j, i)] = value;
        }
    }
    c.bench_function("jacobi_40x40", move |b| b.iter(|| jacobi_eigen(&m).unwrap()));
}

fn bench_inner_product(c: &mut Criterion) {
    let a: Vec<f64> = (0..4096).map(f64::from).collect();
    let b: Vec<f64> = a.iter().rev().cloned().collect();
    c.bench_function("math_vector_inner_product_4096", move |bench| {
        bench.iter(|| vector_inner_product(&a, &b))
    });
}

criterion_group!(detection_perf, bench_integral, bench_search);
criterion_group!(math, bench_jacobi, bench_inner_product);
criterion_main!(detection_perf, math);
