// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime landmark backend.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use super::decode::{DecodeOptions, decode_landmarks};
use super::{DetectorKind, LandmarkDetector};
use crate::config::DetectorConfig;
use crate::download;
use crate::error::{PoseError, Result};
use crate::landmark::LandmarkSet;

/// Landmark detector backed by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex.
/// Callers wait for it at most one timeout budget, then fail with
/// [`PoseError::Timeout`], so an abandoned call can't stall every later one.
pub struct OnnxLandmarkDetector {
    kind: DetectorKind,
    session: Mutex<Session>,
    timeout: Duration,
    input_name: String,
    output_names: Vec<String>,
    input_size: u32,
    options: DecodeOptions,
}

impl OnnxLandmarkDetector {
    /// Square input side expected of the model for `kind`.
    #[must_use]
    pub const fn default_input_size(kind: DetectorKind) -> u32 {
        match kind {
            DetectorKind::Pose | DetectorKind::Face => 256,
            DetectorKind::Hand => 224,
        }
    }

    /// Locate (downloading if configured) and load the model for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::DetectorInit`] if the model file is missing and
    /// can't be fetched, or the session can't be built.
    pub fn load(kind: DetectorKind, config: &DetectorConfig) -> Result<Self> {
        let path = download::ensure_model(
            kind,
            config.model_dir.as_deref(),
            config.model_url.as_deref(),
        )
        .map_err(|e| PoseError::DetectorInit {
            kind,
            message: e.to_string(),
        })?;
        Self::from_file(kind, path, config)
    }

    /// Load a model file for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::DetectorInit`] if the file is missing or invalid.
    pub fn from_file<P: AsRef<Path>>(
        kind: DetectorKind,
        path: P,
        config: &DetectorConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let init_err = |message: String| PoseError::DetectorInit { kind, message };

        if !path.exists() {
            return Err(init_err(format!("Model file not found: {}", path.display())));
        }

        let session = Session::builder()
            .map_err(|e| init_err(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| init_err(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| init_err(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| init_err(format!("Failed to load model {}: {e}", path.display())))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| init_err("model has no inputs".to_string()))?;
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(init_err("model has no outputs".to_string()));
        }

        Ok(Self {
            kind,
            session: Mutex::new(session),
            timeout: config.timeout,
            input_name,
            output_names,
            input_size: Self::default_input_size(kind),
            options: DecodeOptions::for_kind(kind, config),
        })
    }

    /// Detector kind this backend serves.
    #[must_use]
    pub const fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detection_err(&self, message: String) -> PoseError {
        PoseError::Detection {
            kind: self.kind,
            message,
        }
    }

    /// Resize to the model input and lay out as normalized NCHW.
    fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let (src_w, src_h) = image.dimensions();
        let side = self.input_size;

        let src = Image::from_vec_u8(src_w, src_h, image.as_raw().clone(), PixelType::U8x3)
            .map_err(|e| self.detection_err(format!("Invalid source image: {e}")))?;
        let mut dst = Image::new(side, side, PixelType::U8x3);
        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));
        Resizer::new()
            .resize(&src, &mut dst, Some(&options))
            .map_err(|e| self.detection_err(format!("Failed to resize image: {e}")))?;

        let pixels = dst.into_vec();
        let plane = (side * side) as usize;
        let mut planar = vec![0.0f32; 3 * plane];
        for (i, px) in pixels.chunks_exact(3).enumerate() {
            planar[i] = f32::from(px[0]) / 255.0;
            planar[plane + i] = f32::from(px[1]) / 255.0;
            planar[2 * plane + i] = f32::from(px[2]) / 255.0;
        }

        Array4::from_shape_vec((1, 3, side as usize, side as usize), planar)
            .map_err(|e| self.detection_err(format!("Failed to build input tensor: {e}")))
    }

    fn run(&self, input: &Array4<f32>) -> Result<Vec<(Vec<f32>, Vec<usize>)>> {
        let input = input.as_standard_layout();
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| self.detection_err(format!("Failed to create input tensor: {e}")))?;

        let mut session = lock_within(&self.session, self.kind, self.timeout)?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| self.detection_err(format!("Inference failed: {e}")))?;

        let mut extracted = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let Some(value) = outputs.get(name.as_str()) else {
                break;
            };
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| self.detection_err(format!("Failed to extract '{name}': {e}")))?;
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            extracted.push((data.to_vec(), shape));
        }
        Ok(extracted)
    }
}

/// Poll interval while waiting for a busy session.
const LOCK_POLL: Duration = Duration::from_millis(5);

/// Lock `mutex`, giving up with [`PoseError::Timeout`] after `budget`.
fn lock_within<T>(
    mutex: &Mutex<T>,
    kind: DetectorKind,
    budget: Duration,
) -> Result<MutexGuard<'_, T>> {
    let deadline = Instant::now() + budget;
    loop {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                std::thread::sleep(LOCK_POLL);
            }
            Err(TryLockError::WouldBlock) => {
                return Err(PoseError::Timeout {
                    kind,
                    seconds: budget.as_secs_f64(),
                });
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(PoseError::Detection {
                    kind,
                    message: "session lock poisoned".to_string(),
                });
            }
        }
    }
}

impl LandmarkDetector for OnnxLandmarkDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<LandmarkSet>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let input = self.preprocess(image)?;
        let outputs = self.run(&input)?;
        decode_landmarks(self.kind, &outputs, &self.options)
    }
}

impl std::fmt::Debug for OnnxLandmarkDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxLandmarkDetector")
            .field("kind", &self.kind)
            .field("input_name", &self.input_name)
            .field("output_names", &self.output_names)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}
