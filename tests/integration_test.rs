// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the pose-control library

use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use pose_control::detector::SharedDetector;
use pose_control::pipeline::analyze_file;
use pose_control::render::{color, render_document};
use pose_control::{
    BodyPart, DetectorConfig, DetectorKind, DetectorPool, Handedness, Landmark, LandmarkSet,
    PoseDocument, PoseError, RawDetections, RenderConfig, Result, SkeletonMapper, map_detections,
};

/// A person standing upright around normalized x = `cx`, arms at the sides.
fn standing_body(cx: f32) -> LandmarkSet {
    let mut landmarks = vec![Landmark::new(cx, 0.5, 0.05); 33];
    let confident = [
        (0, 0.0, 0.15),
        (2, 0.01, 0.13),
        (5, -0.01, 0.13),
        (7, 0.03, 0.14),
        (8, -0.03, 0.14),
        (11, 0.06, 0.30),
        (12, -0.06, 0.30),
        (13, 0.07, 0.42),
        (14, -0.07, 0.42),
        (15, 0.08, 0.54),
        (16, -0.08, 0.54),
        (23, 0.04, 0.55),
        (24, -0.04, 0.55),
        (25, 0.04, 0.72),
        (26, -0.04, 0.72),
        (27, 0.04, 0.90),
        (28, -0.04, 0.90),
    ];
    for (index, dx, y) in confident {
        landmarks[index] = Landmark::new(cx + dx, y, 0.9);
    }
    LandmarkSet::new(landmarks)
}

/// An open hand with its wrist at `(x, y)`.
fn hand_at(x: f32, y: f32, handedness: Handedness) -> LandmarkSet {
    let landmarks = (0..21)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 * 0.02;
            Landmark::without_visibility(x + t, y + t)
        })
        .collect();
    LandmarkSet::hand(landmarks, handedness)
}

fn fixed(sets: Vec<LandmarkSet>) -> SharedDetector {
    Arc::new(move |_: &RgbImage| -> Result<Vec<LandmarkSet>> { Ok(sets.clone()) })
}

fn write_test_image(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("people.png");
    RgbImage::from_pixel(320, 240, Rgb([90, 120, 150]))
        .save(&path)
        .unwrap();
    path
}

fn count(image: &RgbImage, c: color::Color) -> usize {
    image.pixels().filter(|&&p| p == c.rgb()).count()
}

#[tokio::test]
async fn test_arms_at_sides_renders_without_hands() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_test_image(dir.path());
    let pool = DetectorPool::with_detectors(
        DetectorConfig::default(),
        fixed(vec![standing_body(0.5)]),
        fixed(Vec::new()),
        fixed(Vec::new()),
    );

    let analysis = analyze_file(
        &pool,
        &path,
        &SkeletonMapper::default(),
        &RenderConfig::default(),
    )
    .await
    .unwrap();

    let document = &analysis.document;
    assert_eq!((document.width, document.height), (320, 240));
    assert_eq!(document.people.len(), 1);

    let person = &document.people[0];
    let nose = person.body(BodyPart::Nose);
    assert!((nose.x - 160.0).abs() < 1e-3);
    assert!((nose.y - 36.0).abs() < 1e-3);
    let neck = person.body(BodyPart::Neck);
    assert!((neck.x - 160.0).abs() < 1e-3);
    assert!((neck.confidence - 0.9).abs() < f32::EPSILON);
    assert!(!person.has_left_hand() && !person.has_right_hand());
    assert!(person.body_keypoints().iter().all(|kp| kp.confidence > 0.0));

    let image = &analysis.image;
    assert_eq!(image.dimensions(), (1024, 1024));
    for bone_color in [
        color::Color::RED,
        color::Color::BLUE,
        color::RIGHT_ARM[0],
        color::LEFT_ARM[0],
        color::RIGHT_LEG[0],
        color::LEFT_LEG[0],
    ] {
        assert!(count(image, bone_color) > 0, "missing {bone_color:?}");
    }
    assert_eq!(count(image, color::LEFT_HAND_COLOR), 0);
    assert_eq!(count(image, color::RIGHT_HAND_COLOR), 0);
}

#[tokio::test]
async fn test_nearby_hand_attaches_to_both_people() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_test_image(dir.path());
    let pool = DetectorPool::with_detectors(
        DetectorConfig::default(),
        fixed(vec![standing_body(0.25), standing_body(0.75)]),
        fixed(vec![
            hand_at(0.30, 0.50, Handedness::Left),
            hand_at(0.50, 0.99, Handedness::Right),
        ]),
        fixed(Vec::new()),
    );

    let analysis = analyze_file(
        &pool,
        &path,
        &SkeletonMapper::default(),
        &RenderConfig::default(),
    )
    .await
    .unwrap();

    let people = &analysis.document.people;
    assert_eq!(people.len(), 2);
    // Left hand is within reach of both centres; the right hand of neither.
    assert!(people[0].has_left_hand());
    assert!(people[1].has_left_hand());
    assert!(!people[0].has_right_hand());
    assert!(!people[1].has_right_hand());
    assert!((people[0].left_hand(0).x - 96.0).abs() < 1e-3);

    assert!(count(&analysis.image, color::LEFT_HAND_COLOR) > 0);
    assert_eq!(count(&analysis.image, color::RIGHT_HAND_COLOR), 0);
}

#[tokio::test]
async fn test_slow_detector_times_out() {
    let slow: SharedDetector = Arc::new(|_: &RgbImage| -> Result<Vec<LandmarkSet>> {
        std::thread::sleep(Duration::from_millis(400));
        Ok(Vec::new())
    });
    let config = DetectorConfig::default().with_timeout(Duration::from_millis(40));
    let pool = DetectorPool::with_detectors(
        config,
        fixed(vec![standing_body(0.5)]),
        fixed(Vec::new()),
        slow,
    );

    let image = image::DynamicImage::ImageRgb8(RgbImage::new(32, 32));
    let err = pool.detect_image(&image).await.unwrap_err();

    assert!(matches!(
        err,
        PoseError::Timeout {
            kind: DetectorKind::Face,
            ..
        }
    ));
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("face"));
}

#[test]
fn test_document_survives_json_and_renders_identically() {
    let mut raw = RawDetections::new(640, 480);
    raw.bodies = vec![standing_body(0.4)];
    raw.hands = vec![hand_at(0.46, 0.52, Handedness::Right)];
    raw.faces = vec![LandmarkSet::new(vec![
        Landmark::without_visibility(0.4, 0.15);
        468
    ])];

    let document = map_detections(&raw);
    assert!(document.people[0].has_right_hand());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pose.json");
    document.save(&path).unwrap();
    let loaded = PoseDocument::load(&path).unwrap();
    assert_eq!(loaded, document);

    let config = RenderConfig::default().with_size(256).with_padding(24);
    assert_eq!(
        render_document(&loaded, &config),
        render_document(&document, &config)
    );
}

#[test]
fn test_empty_detections_render_black() {
    let document = map_detections(&RawDetections::new(100, 100));
    assert!(document.people.is_empty());

    let canvas = render_document(&document, &RenderConfig::default());
    assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0]));
}
