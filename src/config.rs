// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pipeline configuration.
//!
//! Each stage has its own configuration struct built with the same builder
//! pattern:
//!
//! - [`DetectorConfig`] - instance limits, confidence floors and the per-call
//!   timeout of the detector pool.
//! - [`MapperConfig`] - confidence gate and hand association distance of the
//!   canonical skeleton mapper.
//! - [`RenderConfig`] - canvas geometry and region toggles of the rasterizer.
//!
//! # Example
//!
//! ```rust
//! use pose_control::{DetectorConfig, RenderConfig};
//! use std::time::Duration;
//!
//! let detector = DetectorConfig::new().with_timeout(Duration::from_secs(30));
//! let render = RenderConfig::new().with_size(512).with_padding(50).with_face(false);
//! assert_eq!(render.usable_size(), 412.0);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PoseError, Result};

/// Configuration for the landmark detectors.
///
/// Fixed at construction: changing it after the backends are built has no
/// effect on them.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Maximum simultaneous bodies.
    pub max_poses: usize,
    /// Maximum simultaneous hands.
    pub max_hands: usize,
    /// Maximum simultaneous faces.
    pub max_faces: usize,
    /// Minimum instance score for a detection to be reported.
    pub min_detection_confidence: f32,
    /// Minimum presence score for a landmark to count as visible.
    pub min_presence_confidence: f32,
    /// Minimum tracking confidence. Single images are never tracked across
    /// frames; kept so backends that take it are configured consistently.
    pub min_tracking_confidence: f32,
    /// Hard time budget of each detector call.
    pub timeout: Duration,
    /// Number of intra-op threads for ONNX Runtime (`0` lets it decide).
    pub num_threads: usize,
    /// Directory holding model files. `None` uses the user cache directory.
    pub model_dir: Option<PathBuf>,
    /// Base URL missing model files are fetched from. `None` never downloads.
    pub model_url: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_poses: 5,
            max_hands: 10,
            max_faces: 5,
            min_detection_confidence: 0.3,
            min_presence_confidence: 0.3,
            min_tracking_confidence: 0.3,
            timeout: Duration::from_secs(15),
            num_threads: 0,
            model_dir: None,
            model_url: None,
        }
    }
}

impl DetectorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of bodies, hands and faces.
    #[must_use]
    pub const fn with_max_instances(mut self, poses: usize, hands: usize, faces: usize) -> Self {
        self.max_poses = poses;
        self.max_hands = hands;
        self.max_faces = faces;
        self
    }

    /// Set the detection, presence and tracking confidence floors at once.
    #[must_use]
    pub const fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_detection_confidence = confidence;
        self.min_presence_confidence = confidence;
        self.min_tracking_confidence = confidence;
        self
    }

    /// Set the per-detector timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of ONNX Runtime intra-op threads.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Read model files from (and download them to) `dir`.
    #[must_use]
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Fetch missing model files from `base_url` (`<base_url>/<file>`).
    #[must_use]
    pub fn with_model_url(mut self, base_url: impl Into<String>) -> Self {
        self.model_url = Some(base_url.into());
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] when a confidence is outside `[0, 1]`,
    /// the timeout is zero, or the model URL is not HTTP(S).
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_presence_confidence", self.min_presence_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PoseError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(PoseError::Config("timeout must be non-zero".to_string()));
        }
        if let Some(url) = &self.model_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(PoseError::Config(format!(
                    "model URL must be http(s), got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the canonical skeleton mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperConfig {
    /// Landmarks at or below this confidence are treated as absent.
    pub keypoint_threshold: f32,
    /// Hands whose wrist is this far or further from a person centre are not
    /// associated with that person (normalized units).
    pub hand_distance_threshold: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            keypoint_threshold: 0.2,
            hand_distance_threshold: 0.5,
        }
    }
}

impl MapperConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keypoint confidence gate.
    #[must_use]
    pub const fn with_keypoint_threshold(mut self, threshold: f32) -> Self {
        self.keypoint_threshold = threshold;
        self
    }

    /// Set the hand association distance.
    #[must_use]
    pub const fn with_hand_distance(mut self, distance: f32) -> Self {
        self.hand_distance_threshold = distance;
        self
    }
}

/// Configuration for the skeleton rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderConfig {
    /// Side length of the square output canvas in pixels.
    pub size: u32,
    /// Empty margin kept on each side of the skeleton.
    pub padding: u32,
    /// Draw the body bones and joints.
    pub draw_body: bool,
    /// Draw the head bones and face mesh points.
    pub draw_face: bool,
    /// Draw both hands.
    pub draw_hands: bool,
    /// Bone stroke width in pixels.
    pub line_width: u32,
    /// Joint circle radius in pixels.
    pub joint_radius: u32,
    /// Keypoints at or below this confidence are neither fitted nor drawn.
    pub confidence_threshold: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            padding: 100,
            draw_body: true,
            draw_face: true,
            draw_hands: true,
            line_width: 4,
            joint_radius: 4,
            confidence_threshold: 0.1,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the canvas size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the padding on each side.
    #[must_use]
    pub const fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Enable or disable body rendering.
    #[must_use]
    pub const fn with_body(mut self, enabled: bool) -> Self {
        self.draw_body = enabled;
        self
    }

    /// Enable or disable face rendering.
    #[must_use]
    pub const fn with_face(mut self, enabled: bool) -> Self {
        self.draw_face = enabled;
        self
    }

    /// Enable or disable hand rendering.
    #[must_use]
    pub const fn with_hands(mut self, enabled: bool) -> Self {
        self.draw_hands = enabled;
        self
    }

    /// Set bone width and joint radius.
    #[must_use]
    pub const fn with_stroke(mut self, line_width: u32, joint_radius: u32) -> Self {
        self.line_width = line_width;
        self.joint_radius = joint_radius;
        self
    }

    /// Canvas extent left for the skeleton once padding is removed.
    ///
    /// Never below one pixel, so oversized padding degrades instead of
    /// flipping the skeleton.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn usable_size(&self) -> f32 {
        (self.size as f32 - 2.0 * self.padding as f32).max(1.0)
    }
}
