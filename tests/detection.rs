//! End-to-end detection: cascade XML text in, rectangles out.

use std::sync::Arc;

use haarface::{
    detect_faces, group_rectangles, read_cascade, CascadeClassifier, Detector, Error,
    HaarDetector, ImageData, IntegralImages, Rectangle,
};

/// 24x24 window, one stage, one stump on a left-minus-right two-rectangle feature.
const EDGE_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>24</height>
  <width>24</width>
  <stages>
    <_>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>-1. 1. 0 0.</internalNodes></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>0 0 12 24 1.</_>
        <_>12 0 12 24 -1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

fn left_brighter_image(width: u32, height: u32, split: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..split {
            pixels[(y * width + x) as usize] = 200;
        }
    }
    pixels
}

#[test]
fn single_window_vote_is_accepted() {
    let model = read_cascade(EDGE_CASCADE).unwrap();

    // left half sums to 100, right half to 80
    let mut pixels = vec![0u8; 24 * 24];
    pixels[5 * 24 + 3] = 100;
    pixels[10 * 24 + 20] = 80;

    let integrals = IntegralImages::for_model(&model, &pixels, 24, 24);
    let classifier = CascadeClassifier::new(&model, &integrals);
    let window = Rectangle::new(0, 0, 24, 24);
    assert_eq!(20.0, classifier.evaluate_feature(model.feature(0), &window));
    assert!(classifier.classify(&window));

    let hits = detect_faces(Arc::new(model), &pixels, 24, 24).unwrap();
    assert_eq!(vec![window], hits);
}

#[test]
fn right_brighter_window_is_rejected() {
    let model = Arc::new(read_cascade(EDGE_CASCADE).unwrap());
    let mut pixels = vec![0u8; 24 * 24];
    pixels[3] = 80;
    pixels[20] = 100;
    assert!(detect_faces(model, &pixels, 24, 24).unwrap().is_empty());
}

#[test]
fn hits_are_reported_without_merging() {
    let model = Arc::new(read_cascade(EDGE_CASCADE).unwrap());
    let (width, height) = (48, 32);
    let pixels = left_brighter_image(width, height, 24);
    let detector = HaarDetector::new(model);
    let hits = detector.detect(&ImageData::new(&pixels, width, height));

    // windows whose left half is not darker than their right half
    assert!(hits.len() > 1);
    assert!(hits.contains(&Rectangle::new(0, 0, 24, 24)));
    assert!(hits.contains(&Rectangle::new(12, 0, 24, 24)));
    for hit in &hits {
        assert!(hit.x() as u32 + hit.width() <= width);
        assert!(hit.y() as u32 + hit.height() <= height);
    }

    // the clustering add-on collapses overlapping windows on demand only
    let groups = group_rectangles(&hits, 0.3, 1);
    assert!(groups.len() < hits.len());
    assert_eq!(hits.len(), groups.iter().map(|g| g.members()).sum::<usize>());
}

#[test]
fn detection_is_deterministic() {
    let model = Arc::new(read_cascade(EDGE_CASCADE).unwrap());
    let pixels = left_brighter_image(64, 64, 30);
    let detector = HaarDetector::new(model);
    let image = ImageData::new(&pixels, 64, 64);
    assert_eq!(detector.detect(&image), detector.detect(&image));
}

#[test]
fn detector_is_shareable_between_threads() {
    let model = Arc::new(read_cascade(EDGE_CASCADE).unwrap());
    let detector: Arc<dyn Detector> = Arc::new(HaarDetector::new(model));
    let pixels = Arc::new(left_brighter_image(40, 40, 20));
    let expected = detector.detect(&ImageData::new(&pixels, 40, 40));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let detector = Arc::clone(&detector);
            let pixels = Arc::clone(&pixels);
            std::thread::spawn(move || detector.detect(&ImageData::new(&pixels, 40, 40)))
        })
        .collect();
    for handle in handles {
        assert_eq!(expected, handle.join().unwrap());
    }
}

#[test]
fn malformed_cascade_is_rejected() {
    let broken = EDGE_CASCADE.replace("<_>12 0 12 24 -1.</_>", "<_>12 0 12</_>");
    assert!(matches!(read_cascade(&broken), Err(Error::Parse(_))));
}

#[test]
fn missing_cascade_file() {
    let path = std::env::temp_dir().join("haarface-missing-cascade.xml");
    assert!(matches!(
        haarface::create_detector(&path),
        Err(Error::ResourceNotFound(_))
    ));
}
