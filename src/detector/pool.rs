// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Detector pool: lazy construction and timeout-guarded detection.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, RgbImage};
use tokio::sync::OnceCell;

use super::{DetectorKind, LandmarkDetector};
use crate::config::DetectorConfig;
use crate::error::{PoseError, Result};
use crate::landmark::{LandmarkSet, RawDetections};
use crate::verbose;

/// A detector shared between the pool and its blocking workers.
pub type SharedDetector = Arc<dyn LandmarkDetector>;

/// Builds the backend for one detector kind. Runs on a blocking worker.
pub type DetectorLoader =
    Arc<dyn Fn(DetectorKind, &DetectorConfig) -> Result<SharedDetector> + Send + Sync>;

/// The three ready-to-use detectors.
#[derive(Clone)]
pub struct Detectors {
    /// Body pose detector.
    pub pose: SharedDetector,
    /// Hand detector.
    pub hand: SharedDetector,
    /// Face mesh detector.
    pub face: SharedDetector,
}

impl Detectors {
    /// Detector for `kind`.
    #[must_use]
    pub fn get(&self, kind: DetectorKind) -> &SharedDetector {
        match kind {
            DetectorKind::Pose => &self.pose,
            DetectorKind::Hand => &self.hand,
            DetectorKind::Face => &self.face,
        }
    }
}

/// Owns the body, hand and face detectors and runs them on images.
///
/// Each backend is built at most once per pool, on first use, and is
/// read-only afterwards, so one pool can serve concurrent requests.
///
/// # Example
///
/// ```no_run
/// use pose_control::{DetectorConfig, DetectorPool};
///
/// # async fn run() -> pose_control::Result<()> {
/// let pool = DetectorPool::new(DetectorConfig::default());
/// let raw = pool.detect("person.jpg").await?;
/// println!("{} bodies, {} hands", raw.bodies.len(), raw.hands.len());
/// # Ok(())
/// # }
/// ```
pub struct DetectorPool {
    config: DetectorConfig,
    loader: DetectorLoader,
    pose: OnceCell<SharedDetector>,
    hand: OnceCell<SharedDetector>,
    face: OnceCell<SharedDetector>,
}

impl DetectorPool {
    /// Create a pool that builds the default ONNX backends on first use.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_loader(config, default_loader())
    }

    /// Create a pool that builds its backends with `loader`.
    #[must_use]
    pub fn with_loader(config: DetectorConfig, loader: DetectorLoader) -> Self {
        Self {
            config,
            loader,
            pose: OnceCell::new(),
            hand: OnceCell::new(),
            face: OnceCell::new(),
        }
    }

    /// Create a pool around already constructed detectors.
    #[must_use]
    pub fn with_detectors(
        config: DetectorConfig,
        pose: SharedDetector,
        hand: SharedDetector,
        face: SharedDetector,
    ) -> Self {
        Self {
            config,
            loader: default_loader(),
            pose: OnceCell::new_with(Some(pose)),
            hand: OnceCell::new_with(Some(hand)),
            face: OnceCell::new_with(Some(face)),
        }
    }

    /// The pool configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Whether all three detectors have been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        DetectorKind::ALL
            .iter()
            .all(|&kind| self.cell(kind).initialized())
    }

    /// Build (once) and return the three detectors.
    ///
    /// Missing backends are constructed concurrently and awaited together.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::DetectorInit`] naming the first backend that
    /// failed to build. Nothing is retried.
    pub async fn acquire_detectors(&self) -> Result<Detectors> {
        let (pose, hand, face) = tokio::try_join!(
            self.acquire(DetectorKind::Pose),
            self.acquire(DetectorKind::Hand),
            self.acquire(DetectorKind::Face),
        )?;
        Ok(Detectors { pose, hand, face })
    }

    /// Decode an image file and run all three detectors on it.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ImageDecode`] if the file can't be read or
    /// decoded, [`PoseError::DetectorInit`] if a backend can't be built, and
    /// [`PoseError::Timeout`] or [`PoseError::Detection`] if a detector fails.
    pub async fn detect<P: AsRef<Path>>(&self, path: P) -> Result<RawDetections> {
        let image = decode_file(path.as_ref()).await?;
        self.detect_image(&image).await
    }

    /// Run all three detectors on a decoded image.
    ///
    /// Detectors run one after another, each raced against the configured
    /// timeout. All three settle before anything is returned; the first
    /// failure in pose, hand, face order is reported.
    ///
    /// A timed-out call keeps running on its blocking worker until the backend
    /// returns. ONNX backends wait at most one timeout budget for a session
    /// still held by such a call, then give up with [`PoseError::Timeout`].
    ///
    /// # Errors
    ///
    /// See [`detect`](Self::detect).
    pub async fn detect_image(&self, image: &DynamicImage) -> Result<RawDetections> {
        let detectors = self.acquire_detectors().await?;
        let image = Arc::new(image.to_rgb8());
        let (width, height) = image.dimensions();

        let mut settled = Vec::with_capacity(DetectorKind::ALL.len());
        for kind in DetectorKind::ALL {
            settled.push((kind, self.run(kind, detectors.get(kind), &image).await));
        }

        let mut raw = RawDetections::new(width, height);
        for (kind, sets) in settled {
            let sets = sets?;
            match kind {
                DetectorKind::Pose => raw.bodies = sets,
                DetectorKind::Hand => raw.hands = sets,
                DetectorKind::Face => raw.faces = sets,
            }
        }
        Ok(raw)
    }

    fn cell(&self, kind: DetectorKind) -> &OnceCell<SharedDetector> {
        match kind {
            DetectorKind::Pose => &self.pose,
            DetectorKind::Hand => &self.hand,
            DetectorKind::Face => &self.face,
        }
    }

    const fn max_instances(&self, kind: DetectorKind) -> usize {
        match kind {
            DetectorKind::Pose => self.config.max_poses,
            DetectorKind::Hand => self.config.max_hands,
            DetectorKind::Face => self.config.max_faces,
        }
    }

    async fn acquire(&self, kind: DetectorKind) -> Result<SharedDetector> {
        let detector = self
            .cell(kind)
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let config = self.config.clone();
                let start = Instant::now();

                let built = tokio::task::spawn_blocking(move || loader(kind, &config))
                    .await
                    .map_err(|e| PoseError::DetectorInit {
                        kind,
                        message: format!("loader task failed: {e}"),
                    })?
                    .map_err(|e| match e {
                        PoseError::DetectorInit { .. } => e,
                        other => PoseError::DetectorInit {
                            kind,
                            message: other.to_string(),
                        },
                    })?;

                verbose!(
                    "{kind} detector ready in {:.1}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                Ok::<_, PoseError>(built)
            })
            .await?;
        Ok(Arc::clone(detector))
    }

    async fn run(
        &self,
        kind: DetectorKind,
        detector: &SharedDetector,
        image: &Arc<RgbImage>,
    ) -> Result<Vec<LandmarkSet>> {
        let task = {
            let detector = Arc::clone(detector);
            let image = Arc::clone(image);
            tokio::task::spawn_blocking(move || detector.detect(&image))
        };

        let start = Instant::now();
        // A timed-out worker is abandoned; its result is dropped when it ends.
        match tokio::time::timeout(self.config.timeout, task).await {
            Ok(Ok(result)) => {
                let mut sets = result.map_err(|e| match e {
                    PoseError::Detection { .. } | PoseError::Timeout { .. } => e,
                    other => PoseError::Detection {
                        kind,
                        message: other.to_string(),
                    },
                })?;
                sets.truncate(self.max_instances(kind));
                verbose!(
                    "{kind}: {} found in {:.1}ms",
                    sets.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                Ok(sets)
            }
            Ok(Err(e)) => Err(PoseError::Detection {
                kind,
                message: format!("detector task failed: {e}"),
            }),
            Err(_) => Err(PoseError::Timeout {
                kind,
                seconds: self.config.timeout.as_secs_f64(),
            }),
        }
    }
}

impl std::fmt::Debug for DetectorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorPool")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Decode an in-memory image.
///
/// # Errors
///
/// Returns [`PoseError::ImageDecode`] if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| PoseError::ImageDecode(e.to_string()))
}

/// Read and decode an image file.
///
/// The file contents live only inside the decode task and are dropped as soon
/// as decoding finishes, successfully or not.
async fn decode_file(path: &Path) -> Result<DynamicImage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        PoseError::ImageDecode(format!("Failed to read image {}: {e}", path.display()))
    })?;
    let display = path.display().to_string();

    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| PoseError::ImageDecode(format!("decode task failed: {e}")))?
        .map_err(|e| match e {
            PoseError::ImageDecode(msg) => {
                PoseError::ImageDecode(format!("Failed to decode image {display}: {msg}"))
            }
            other => other,
        })
}

#[cfg(feature = "onnx")]
fn default_loader() -> DetectorLoader {
    Arc::new(|kind, config| {
        let detector = super::OnnxLandmarkDetector::load(kind, config)?;
        Ok(Arc::new(detector) as SharedDetector)
    })
}

#[cfg(not(feature = "onnx"))]
fn default_loader() -> DetectorLoader {
    Arc::new(|kind, _config| {
        Err(PoseError::DetectorInit {
            kind,
            message: "built without the `onnx` feature".to_string(),
        })
    })
}
