// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! End-to-end analysis: detect, map to canonical skeletons, rasterize.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, RgbImage};

use crate::config::RenderConfig;
use crate::detector::DetectorPool;
use crate::error::Result;
use crate::keypoints::PoseDocument;
use crate::landmark::RawDetections;
use crate::mapper::SkeletonMapper;
use crate::render::render_document;

/// Wall-clock time spent in each stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Speed {
    /// Landmark detection, including decode and first-use model loading.
    pub detect: Option<f64>,
    /// Canonical skeleton mapping.
    pub map: Option<f64>,
    /// Rasterization.
    pub render: Option<f64>,
}

impl Speed {
    /// Create a new `Speed` with all timings.
    #[must_use]
    pub const fn new(detect: f64, map: f64, render: f64) -> Self {
        Self {
            detect: Some(detect),
            map: Some(map),
            render: Some(render),
        }
    }

    /// Sum of all recorded stages.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.detect.unwrap_or(0.0) + self.map.unwrap_or(0.0) + self.render.unwrap_or(0.0)
    }
}

/// Result of analyzing one image.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Canonical skeletons in source pixel space.
    pub document: PoseDocument,
    /// Rendered skeleton canvas.
    pub image: RgbImage,
    /// Stage timings.
    pub speed: Speed,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn finish(
    raw: &RawDetections,
    detect_ms: f64,
    mapper: &SkeletonMapper,
    render: &RenderConfig,
) -> Analysis {
    let start = Instant::now();
    let document = mapper.map(raw);
    let map_ms = elapsed_ms(start);

    let start = Instant::now();
    let image = render_document(&document, render);
    let render_ms = elapsed_ms(start);

    Analysis {
        document,
        image,
        speed: Speed::new(detect_ms, map_ms, render_ms),
    }
}

/// Analyze an image file.
///
/// # Errors
///
/// Propagates detector pool errors; mapping and rendering never fail.
pub async fn analyze_file<P: AsRef<Path>>(
    pool: &DetectorPool,
    path: P,
    mapper: &SkeletonMapper,
    render: &RenderConfig,
) -> Result<Analysis> {
    let start = Instant::now();
    let raw = pool.detect(path).await?;
    Ok(finish(&raw, elapsed_ms(start), mapper, render))
}

/// Analyze an already decoded image.
///
/// # Errors
///
/// Propagates detector pool errors; mapping and rendering never fail.
pub async fn analyze_image(
    pool: &DetectorPool,
    image: &DynamicImage,
    mapper: &SkeletonMapper,
    render: &RenderConfig,
) -> Result<Analysis> {
    let start = Instant::now();
    let raw = pool.detect_image(image).await?;
    Ok(finish(&raw, elapsed_ms(start), mapper, render))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::detector::SharedDetector;
    use crate::error::PoseError;
    use crate::landmark::{Landmark, LandmarkSet};
    use std::sync::Arc;

    fn detector(sets: Vec<LandmarkSet>) -> SharedDetector {
        Arc::new(move |_: &RgbImage| -> Result<Vec<LandmarkSet>> { Ok(sets.clone()) })
    }

    #[test]
    fn test_speed_total() {
        let speed = Speed::new(10.0, 1.0, 2.5);
        assert!((speed.total() - 13.5).abs() < f64::EPSILON);
        assert!(Speed::default().total().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_analyze_image() {
        let body = LandmarkSet::new(
            (0..33)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let t = i as f32 / 40.0;
                    Landmark::new(0.3 + t / 4.0, 0.1 + t, 0.9)
                })
                .collect(),
        );
        let pool = DetectorPool::with_detectors(
            DetectorConfig::default(),
            detector(vec![body]),
            detector(Vec::new()),
            detector(Vec::new()),
        );
        let image = DynamicImage::ImageRgb8(RgbImage::new(200, 100));
        let render = RenderConfig::default().with_size(128).with_padding(8);

        let analysis = analyze_image(&pool, &image, &SkeletonMapper::default(), &render)
            .await
            .unwrap();

        assert_eq!((analysis.document.width, analysis.document.height), (200, 100));
        assert_eq!(analysis.document.people.len(), 1);
        assert_eq!(analysis.image.dimensions(), (128, 128));
        assert!(analysis.image.pixels().any(|p| p.0 != [0, 0, 0]));
        assert!(analysis.speed.detect.is_some());
    }

    #[tokio::test]
    async fn test_analyze_file_propagates_decode_error() {
        let pool = DetectorPool::with_detectors(
            DetectorConfig::default(),
            detector(Vec::new()),
            detector(Vec::new()),
            detector(Vec::new()),
        );
        let err = analyze_file(
            &pool,
            "missing.png",
            &SkeletonMapper::default(),
            &RenderConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PoseError::ImageDecode(_)));
    }
}
